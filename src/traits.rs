//! Traits for storage abstraction and external collaborator seams

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Storage abstraction for the ledger and reconciliation engine
///
/// This trait allows the core to work with any document or row store
/// (PostgreSQL, MongoDB, in-memory, etc.). Every query is tenant-scoped by an
/// explicit `organization_id`; implementations must never fall back to
/// ambient tenant state.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert a new account
    async fn insert_account(&self, account: &Account) -> LedgerResult<()>;

    /// Get an account by id, only if it belongs to the organization
    async fn get_account(
        &self,
        organization_id: &str,
        account_id: &str,
    ) -> LedgerResult<Option<Account>>;

    /// Whether an account with this id exists under any organization
    ///
    /// Lets callers distinguish a missing account from a cross-tenant access
    /// attempt without widening `get_account` beyond its tenant scope.
    async fn account_exists(&self, account_id: &str) -> LedgerResult<bool>;

    /// Apply a transaction to the account as one atomic read-modify-write
    ///
    /// Implementations must, inside a single transactional scope serialized
    /// per account: read the current stored balance, add the transaction's
    /// signed amount to it, and insert the transaction record. Both writes
    /// become visible together; no caller may ever observe the transaction
    /// without the balance reflecting it, or the balance without the
    /// transaction. The commit fails with [`LedgerError::AccountNotFound`]
    /// for an unknown account, with [`LedgerError::DuplicateBackfill`] when
    /// the transaction carries a dedup key already present on the account,
    /// and with [`LedgerError::Validation`] for a duplicate transaction id;
    /// on any error, neither write is visible. Returns the account as
    /// updated by the commit.
    ///
    /// Applying the delta against the stored balance (rather than accepting
    /// a caller-computed balance) is what keeps concurrent committers from
    /// losing updates, no matter how many service instances share the store.
    async fn commit_transaction(
        &self,
        organization_id: &str,
        account_id: &str,
        transaction: &Transaction,
    ) -> LedgerResult<Account>;

    /// Get a transaction by id within the organization
    async fn get_transaction(
        &self,
        organization_id: &str,
        transaction_id: &str,
    ) -> LedgerResult<Option<Transaction>>;

    /// List transactions for an account in commit order, optionally bounded
    /// by an inclusive business-date range
    async fn list_account_transactions(
        &self,
        organization_id: &str,
        account_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> LedgerResult<Vec<Transaction>>;

    /// Find a transaction on the account carrying the given dedup key
    async fn find_transaction_by_dedup_key(
        &self,
        organization_id: &str,
        account_id: &str,
        dedup_key: &str,
    ) -> LedgerResult<Option<Transaction>>;

    /// Insert a new reconciliation session
    async fn insert_session(&self, session: &ReconciliationSession) -> LedgerResult<()>;

    /// Get a reconciliation session by id within the organization
    async fn get_session(
        &self,
        organization_id: &str,
        session_id: &str,
    ) -> LedgerResult<Option<ReconciliationSession>>;

    /// Update the status of a reconciliation session
    async fn update_session_status(
        &self,
        organization_id: &str,
        session_id: &str,
        status: SessionStatus,
    ) -> LedgerResult<()>;
}

/// Tenant context resolved for an acting user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantContext {
    pub organization_id: String,
    pub role: String,
}

/// Authorization and tenant resolution, provided by the host application
#[async_trait]
pub trait TenantResolver: Send + Sync {
    /// Resolve the organization and role for an actor
    async fn resolve_tenant(&self, actor_id: &str) -> LedgerResult<TenantContext>;
}

/// Bank-file normalization, provided by the host application
///
/// Turns a raw statement file (OFX, CSV, ...) into the normalized entries
/// consumed by the matcher. Parsing mechanics are outside this crate.
pub trait StatementNormalizer: Send + Sync {
    /// Parse raw file content into normalized statement entries
    fn parse_statement(&self, raw_content: &str) -> LedgerResult<Vec<StatementEntry>>;
}
