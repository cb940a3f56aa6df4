//! In-memory storage implementation for testing and development

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::traits::LedgerStore;
use crate::types::*;

type TenantKey = (String, String);

/// In-memory [`LedgerStore`] backed by shared maps
///
/// Clones share the same underlying data. Transactions are kept in a vector
/// so commit order is preserved for listing.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    accounts: Arc<RwLock<HashMap<TenantKey, Account>>>,
    transactions: Arc<RwLock<Vec<Transaction>>>,
    sessions: Arc<RwLock<HashMap<TenantKey, ReconciliationSession>>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.accounts.write().unwrap().clear();
        self.transactions.write().unwrap().clear();
        self.sessions.write().unwrap().clear();
    }
}

fn in_date_range(
    date: NaiveDate,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> bool {
    if let Some(start) = start_date {
        if date < start {
            return false;
        }
    }
    if let Some(end) = end_date {
        if date > end {
            return false;
        }
    }
    true
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn insert_account(&self, account: &Account) -> LedgerResult<()> {
        let key = (account.organization_id.clone(), account.id.clone());
        let mut accounts = self.accounts.write().unwrap();
        if accounts.contains_key(&key) {
            return Err(LedgerError::Validation(format!(
                "Account '{}' already exists",
                account.id
            )));
        }
        accounts.insert(key, account.clone());
        Ok(())
    }

    async fn get_account(
        &self,
        organization_id: &str,
        account_id: &str,
    ) -> LedgerResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .unwrap()
            .get(&(organization_id.to_string(), account_id.to_string()))
            .cloned())
    }

    async fn account_exists(&self, account_id: &str) -> LedgerResult<bool> {
        Ok(self
            .accounts
            .read()
            .unwrap()
            .keys()
            .any(|(_, id)| id == account_id))
    }

    async fn commit_transaction(
        &self,
        organization_id: &str,
        account_id: &str,
        transaction: &Transaction,
    ) -> LedgerResult<Account> {
        // Both write locks are held for the whole commit: the delta is
        // applied to the stored balance and the record inserted while no
        // other committer can interleave, so the balance and the transaction
        // become visible together.
        let mut accounts = self.accounts.write().unwrap();
        let mut transactions = self.transactions.write().unwrap();

        let key = (organization_id.to_string(), account_id.to_string());
        let account = accounts
            .get_mut(&key)
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;

        if transactions.iter().any(|t| t.id == transaction.id) {
            return Err(LedgerError::Validation(format!(
                "Transaction '{}' already exists",
                transaction.id
            )));
        }
        if let Some(dedup_key) = transaction.dedup_key.as_deref() {
            let taken = transactions.iter().any(|t| {
                t.organization_id == organization_id
                    && t.account_id == account_id
                    && t.dedup_key.as_deref() == Some(dedup_key)
            });
            if taken {
                return Err(LedgerError::DuplicateBackfill(dedup_key.to_string()));
            }
        }

        account.balance = &account.balance + &transaction.signed_amount();
        account.updated_at = chrono::Utc::now().naive_utc();
        let updated = account.clone();
        transactions.push(transaction.clone());
        Ok(updated)
    }

    async fn get_transaction(
        &self,
        organization_id: &str,
        transaction_id: &str,
    ) -> LedgerResult<Option<Transaction>> {
        Ok(self
            .transactions
            .read()
            .unwrap()
            .iter()
            .find(|t| t.organization_id == organization_id && t.id == transaction_id)
            .cloned())
    }

    async fn list_account_transactions(
        &self,
        organization_id: &str,
        account_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> LedgerResult<Vec<Transaction>> {
        Ok(self
            .transactions
            .read()
            .unwrap()
            .iter()
            .filter(|t| {
                t.organization_id == organization_id
                    && t.account_id == account_id
                    && in_date_range(t.date, start_date, end_date)
            })
            .cloned()
            .collect())
    }

    async fn find_transaction_by_dedup_key(
        &self,
        organization_id: &str,
        account_id: &str,
        dedup_key: &str,
    ) -> LedgerResult<Option<Transaction>> {
        Ok(self
            .transactions
            .read()
            .unwrap()
            .iter()
            .find(|t| {
                t.organization_id == organization_id
                    && t.account_id == account_id
                    && t.dedup_key.as_deref() == Some(dedup_key)
            })
            .cloned())
    }

    async fn insert_session(&self, session: &ReconciliationSession) -> LedgerResult<()> {
        let key = (session.organization_id.clone(), session.id.clone());
        let mut sessions = self.sessions.write().unwrap();
        if sessions.contains_key(&key) {
            return Err(LedgerError::Validation(format!(
                "Reconciliation session '{}' already exists",
                session.id
            )));
        }
        sessions.insert(key, session.clone());
        Ok(())
    }

    async fn get_session(
        &self,
        organization_id: &str,
        session_id: &str,
    ) -> LedgerResult<Option<ReconciliationSession>> {
        Ok(self
            .sessions
            .read()
            .unwrap()
            .get(&(organization_id.to_string(), session_id.to_string()))
            .cloned())
    }

    async fn update_session_status(
        &self,
        organization_id: &str,
        session_id: &str,
        status: SessionStatus,
    ) -> LedgerResult<()> {
        let mut sessions = self.sessions.write().unwrap();
        match sessions.get_mut(&(organization_id.to_string(), session_id.to_string())) {
            Some(session) => {
                session.status = status;
                Ok(())
            }
            None => Err(LedgerError::SessionNotFound(session_id.to_string())),
        }
    }
}
