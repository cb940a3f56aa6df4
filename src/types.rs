//! Core types and data structures for the ledger and reconciliation engine

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a ledger transaction relative to the account balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Money flowing into the account (balance increases)
    Income,
    /// Money flowing out of the account (balance decreases)
    Expense,
}

impl TransactionType {
    /// Signed balance delta for a positive transaction amount
    pub fn signed_delta(&self, amount: &BigDecimal) -> BigDecimal {
        match self {
            TransactionType::Income => amount.clone(),
            TransactionType::Expense => -amount.clone(),
        }
    }
}

/// A tenant-scoped account whose balance is mutated only by the ledger service
///
/// Invariant: `balance` equals the sum of signed deltas of every transaction
/// ever committed against the account, with no transaction applied twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier for the account
    pub id: String,
    /// Owning tenant
    pub organization_id: String,
    /// Human-readable account name
    pub name: String,
    /// Current balance (signed decimal)
    pub balance: BigDecimal,
    /// Whether the account accepts new transactions
    pub is_active: bool,
    /// When the account was created
    pub created_at: NaiveDateTime,
    /// When the account was last updated
    pub updated_at: NaiveDateTime,
}

impl Account {
    /// Create a new active account with a zero balance
    pub fn new(id: String, organization_id: String, name: String) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id,
            organization_id,
            name,
            balance: BigDecimal::from(0),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A committed ledger transaction, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier for the transaction
    pub id: String,
    /// Account the transaction is committed against
    pub account_id: String,
    /// Owning tenant
    pub organization_id: String,
    /// Transaction amount, strictly positive; direction comes from `transaction_type`
    pub amount: BigDecimal,
    /// Income or expense
    pub transaction_type: TransactionType,
    /// Business date of the transaction
    pub date: NaiveDate,
    /// Description of the transaction
    pub description: String,
    /// Deterministic key preventing duplicate backfill creation, if any
    pub dedup_key: Option<String>,
    /// When the transaction was committed
    pub created_at: NaiveDateTime,
}

impl Transaction {
    /// Create a new transaction record with a generated id
    pub fn new(
        account_id: String,
        organization_id: String,
        amount: BigDecimal,
        transaction_type: TransactionType,
        date: NaiveDate,
        description: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            account_id,
            organization_id,
            amount,
            transaction_type,
            date,
            description,
            dedup_key: None,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// Signed effect of this transaction on its account balance
    pub fn signed_amount(&self) -> BigDecimal {
        self.transaction_type.signed_delta(&self.amount)
    }
}

/// One normalized line item from an imported bank statement
///
/// Produced by an external normalizer; positive amounts are inflows,
/// negative amounts are outflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementEntry {
    /// Business date of the statement line
    pub date: NaiveDate,
    /// Signed amount: positive = inflow, negative = outflow
    pub amount: BigDecimal,
    /// Bank-provided description
    pub description: String,
}

impl StatementEntry {
    /// Create a new statement entry
    pub fn new(date: NaiveDate, amount: BigDecimal, description: String) -> Self {
        Self {
            date,
            amount,
            description,
        }
    }

    /// Transaction direction implied by the sign; a zero amount has none
    pub fn direction(&self) -> Option<TransactionType> {
        let zero = BigDecimal::from(0);
        if self.amount > zero {
            Some(TransactionType::Income)
        } else if self.amount < zero {
            Some(TransactionType::Expense)
        } else {
            None
        }
    }

    /// Unsigned amount of the entry
    pub fn absolute_amount(&self) -> BigDecimal {
        self.amount.abs()
    }
}

/// Lifecycle of a reconciliation session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// The statement still has entries without a ledger counterpart
    Pending,
    /// A match pass over the current ledger found zero unmatched entries
    Reconciled,
}

/// A stored statement import: an immutable snapshot of the normalized file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSession {
    /// Unique identifier for the session
    pub id: String,
    /// Account the statement was imported against
    pub account_id: String,
    /// Owning tenant
    pub organization_id: String,
    /// Name of the imported file
    pub source_file_name: String,
    /// Statement entries in imported order, never mutated after creation
    pub statement_entries: Vec<StatementEntry>,
    /// Current reconciliation status
    pub status: SessionStatus,
    /// When the statement was imported
    pub created_at: NaiveDateTime,
}

impl ReconciliationSession {
    /// Create a new pending session with a generated id
    pub fn new(
        account_id: String,
        organization_id: String,
        source_file_name: String,
        statement_entries: Vec<StatementEntry>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            account_id,
            organization_id,
            source_file_name,
            statement_entries,
            status: SessionStatus::Pending,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// A statement entry paired with the ledger transaction that covers it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPair {
    pub entry: StatementEntry,
    pub transaction: Transaction,
}

/// Outcome of one match pass; derived on demand, never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Statement entries with a ledger counterpart
    pub matched_pairs: Vec<MatchedPair>,
    /// Statement entries with no eligible ledger transaction
    pub unmatched_statement_entries: Vec<StatementEntry>,
    /// Ledger transactions not claimed by any statement entry
    pub unmatched_transactions: Vec<Transaction>,
}

impl MatchResult {
    /// True when every statement entry found a ledger counterpart
    pub fn is_fully_matched(&self) -> bool {
        self.unmatched_statement_entries.is_empty()
    }
}

/// Lightweight reference to a committed transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRef {
    pub transaction_id: String,
    pub amount: BigDecimal,
    pub transaction_type: TransactionType,
    pub date: NaiveDate,
}

impl From<&Transaction> for TransactionRef {
    fn from(transaction: &Transaction) -> Self {
        Self {
            transaction_id: transaction.id.clone(),
            amount: transaction.amount.clone(),
            transaction_type: transaction.transaction_type,
            date: transaction.date,
        }
    }
}

/// A backfill item skipped because its dedup key already exists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackfillSkip {
    pub entry: StatementEntry,
    pub dedup_key: String,
}

/// A backfill item that failed; the rest of the batch still ran
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackfillFailure {
    pub entry: StatementEntry,
    pub error: LedgerError,
}

/// Per-item outcome of one backfill pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BackfillReport {
    /// Transactions committed by this pass
    pub created: Vec<TransactionRef>,
    /// Entries skipped as already-backfilled duplicates
    pub skipped: Vec<BackfillSkip>,
    /// Entries that could not be backfilled
    pub failed: Vec<BackfillFailure>,
}

impl BackfillReport {
    /// True when nothing in the batch failed (skips are not failures)
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Errors that can occur in the ledger and reconciliation engine
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Reconciliation session not found: {0}")]
    SessionNotFound(String),
    #[error("Account '{account_id}' does not belong to organization '{organization_id}'")]
    CrossTenantAccess {
        organization_id: String,
        account_id: String,
    },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Duplicate backfill for dedup key: {0}")]
    DuplicateBackfill(String),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
