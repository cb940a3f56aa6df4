//! Ledger service: the invariant-preserving core
//!
//! The only component permitted to change `Account.balance`. Validation
//! happens here; the balance mutation itself is the store's atomic
//! per-account read-modify-write, so racing commits never lose updates even
//! when several service instances share one store.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::traits::LedgerStore;
use crate::types::*;
use crate::utils::validation;

/// Service composing account and transaction storage into one atomic
/// "create transaction and adjust balance" operation
#[derive(Clone)]
pub struct LedgerService<S: LedgerStore> {
    store: S,
}

impl<S: LedgerStore> LedgerService<S> {
    /// Create a new ledger service over the given store
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create a transaction and adjust the account balance atomically
    ///
    /// The amount must be strictly positive; the direction comes from
    /// `transaction_type`. On any error no partial state change is visible.
    pub async fn create_transaction(
        &self,
        organization_id: &str,
        account_id: &str,
        amount: BigDecimal,
        transaction_type: TransactionType,
        date: NaiveDate,
        description: &str,
    ) -> LedgerResult<Transaction> {
        self.create_transaction_inner(
            organization_id,
            account_id,
            amount,
            transaction_type,
            date,
            description,
            None,
        )
        .await
    }

    /// Like [`create_transaction`](Self::create_transaction), but carrying a
    /// dedup key
    ///
    /// If a transaction with the same key already exists on the account the
    /// call returns [`LedgerError::DuplicateBackfill`] without touching the
    /// balance. Retrying a partially failed backfill is therefore safe.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_transaction_with_dedup(
        &self,
        organization_id: &str,
        account_id: &str,
        amount: BigDecimal,
        transaction_type: TransactionType,
        date: NaiveDate,
        description: &str,
        dedup_key: &str,
    ) -> LedgerResult<Transaction> {
        self.create_transaction_inner(
            organization_id,
            account_id,
            amount,
            transaction_type,
            date,
            description,
            Some(dedup_key),
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn create_transaction_inner(
        &self,
        organization_id: &str,
        account_id: &str,
        amount: BigDecimal,
        transaction_type: TransactionType,
        date: NaiveDate,
        description: &str,
        dedup_key: Option<&str>,
    ) -> LedgerResult<Transaction> {
        validation::validate_positive_amount(&amount)?;
        validation::validate_description(description)?;

        let account = self.require_account(organization_id, account_id).await?;
        if !account.is_active {
            return Err(LedgerError::Validation(format!(
                "Account '{}' is inactive",
                account_id
            )));
        }

        // Fast-path skip; the store re-checks the key inside the commit, so
        // two racing backfills of the same entry cannot both land.
        if let Some(key) = dedup_key {
            if self
                .store
                .find_transaction_by_dedup_key(organization_id, account_id, key)
                .await?
                .is_some()
            {
                debug!(account_id, dedup_key = key, "dedup key already committed");
                return Err(LedgerError::DuplicateBackfill(key.to_string()));
            }
        }

        let mut transaction = Transaction::new(
            account_id.to_string(),
            organization_id.to_string(),
            amount,
            transaction_type,
            date,
            description.to_string(),
        );
        transaction.dedup_key = dedup_key.map(str::to_string);

        let updated = self
            .store
            .commit_transaction(organization_id, account_id, &transaction)
            .await?;

        info!(
            organization_id,
            account_id,
            transaction_id = %transaction.id,
            amount = %transaction.amount,
            transaction_type = ?transaction.transaction_type,
            balance = %updated.balance,
            "transaction committed"
        );

        Ok(transaction)
    }

    /// Get an account by id within the organization
    pub async fn get_account(
        &self,
        organization_id: &str,
        account_id: &str,
    ) -> LedgerResult<Option<Account>> {
        self.store.get_account(organization_id, account_id).await
    }

    /// Get a transaction by id within the organization
    pub async fn get_transaction(
        &self,
        organization_id: &str,
        transaction_id: &str,
    ) -> LedgerResult<Option<Transaction>> {
        self.store
            .get_transaction(organization_id, transaction_id)
            .await
    }

    /// List transactions for an account, optionally bounded by date
    pub async fn list_account_transactions(
        &self,
        organization_id: &str,
        account_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> LedgerResult<Vec<Transaction>> {
        self.store
            .list_account_transactions(organization_id, account_id, start_date, end_date)
            .await
    }

    /// Load the account or report why it is unavailable
    ///
    /// The tenant-scoped lookup misses both for unknown accounts and for
    /// accounts owned by another organization; the org-free existence probe
    /// separates the two so callers get the right error kind.
    pub(crate) async fn require_account(
        &self,
        organization_id: &str,
        account_id: &str,
    ) -> LedgerResult<Account> {
        match self.store.get_account(organization_id, account_id).await? {
            Some(account) => Ok(account),
            None => {
                if self.store.account_exists(account_id).await? {
                    Err(LedgerError::CrossTenantAccess {
                        organization_id: organization_id.to_string(),
                        account_id: account_id.to_string(),
                    })
                } else {
                    Err(LedgerError::AccountNotFound(account_id.to_string()))
                }
            }
        }
    }
}
