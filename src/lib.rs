//! # Ledger Core
//!
//! A multi-tenant financial ledger and bank-reconciliation engine: atomic
//! balance tracking, deterministic statement matching, and an idempotent
//! backfill workflow.
//!
//! ## Features
//!
//! - **Atomic ledger**: creating a transaction and adjusting the account
//!   balance is one atomic unit, serialized per account under concurrency
//! - **Statement matching**: a pure greedy matcher partitions imported bank
//!   statement entries and ledger transactions into matched and unmatched sets
//! - **Backfill**: unmatched statement entries become ledger transactions,
//!   with dedup keys so retries never create duplicates
//! - **Tenant isolation**: every storage query is scoped to one organization
//! - **Storage abstraction**: database-agnostic design with a trait-based
//!   repository
//!
//! ## Quick Start
//!
//! ```rust
//! use ledger_core::{
//!     Account, LedgerService, LedgerStore, MemoryStore, ReconciliationService,
//!     StatementEntry, TransactionType,
//! };
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ledger_core::LedgerError> {
//! let store = MemoryStore::new();
//! store
//!     .insert_account(&Account::new(
//!         "acct-1".to_string(),
//!         "org-1".to_string(),
//!         "Operating".to_string(),
//!     ))
//!     .await?;
//!
//! let ledger = LedgerService::new(store.clone());
//! ledger
//!     .create_transaction(
//!         "org-1",
//!         "acct-1",
//!         BigDecimal::from(150),
//!         TransactionType::Expense,
//!         NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
//!         "Office chair",
//!     )
//!     .await?;
//!
//! let reconciliation = ReconciliationService::new(store);
//! let session = reconciliation
//!     .create_session(
//!         "org-1",
//!         "acct-1",
//!         "january.ofx",
//!         vec![StatementEntry::new(
//!             NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
//!             BigDecimal::from(-150),
//!             "CARD PAYMENT".to_string(),
//!         )],
//!     )
//!     .await?;
//!
//! let result = reconciliation.match_result("org-1", &session.id).await?;
//! assert!(result.is_fully_matched());
//! # Ok(())
//! # }
//! ```

pub mod ledger;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use ledger::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
pub use utils::memory_store::MemoryStore;
