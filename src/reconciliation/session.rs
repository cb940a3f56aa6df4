//! Reconciliation sessions: statement import, match passes, and backfill

use tracing::{debug, info, warn};

use crate::ledger::LedgerService;
use crate::reconciliation::matcher::match_statement;
use crate::traits::LedgerStore;
use crate::types::*;
use crate::utils::validation;

/// Policy knobs for the reconciliation workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationPolicy {
    /// Move a pending session to `Reconciled` as soon as a match pass finds
    /// zero unmatched statement entries
    pub auto_reconcile: bool,
}

impl Default for ReconciliationPolicy {
    fn default() -> Self {
        Self {
            auto_reconcile: true,
        }
    }
}

/// Orchestrates statement imports, match passes, and the backfill workflow
///
/// All balance mutations go through the wrapped [`LedgerService`]; this
/// service never touches account state directly.
pub struct ReconciliationService<S: LedgerStore + Clone> {
    store: S,
    ledger: LedgerService<S>,
    policy: ReconciliationPolicy,
}

impl<S: LedgerStore + Clone> ReconciliationService<S> {
    /// Create a reconciliation service with the default policy
    pub fn new(store: S) -> Self {
        Self::with_policy(store, ReconciliationPolicy::default())
    }

    /// Create a reconciliation service with an explicit policy
    pub fn with_policy(store: S, policy: ReconciliationPolicy) -> Self {
        Self {
            store: store.clone(),
            ledger: LedgerService::new(store),
            policy,
        }
    }

    /// The ledger service this reconciliation service commits through
    pub fn ledger(&self) -> &LedgerService<S> {
        &self.ledger
    }

    /// Store an imported statement as a new pending session
    ///
    /// The entry list is an immutable snapshot of the imported file; later
    /// match passes always run against it as stored here.
    pub async fn create_session(
        &self,
        organization_id: &str,
        account_id: &str,
        source_file_name: &str,
        statement_entries: Vec<StatementEntry>,
    ) -> LedgerResult<ReconciliationSession> {
        validation::validate_source_file_name(source_file_name)?;
        self.ledger
            .require_account(organization_id, account_id)
            .await?;

        let session = ReconciliationSession::new(
            account_id.to_string(),
            organization_id.to_string(),
            source_file_name.to_string(),
            statement_entries,
        );
        self.store.insert_session(&session).await?;

        info!(
            organization_id,
            account_id,
            session_id = %session.id,
            source_file_name,
            entries = session.statement_entries.len(),
            "reconciliation session created"
        );

        Ok(session)
    }

    /// Get a session by id within the organization
    pub async fn get_session(
        &self,
        organization_id: &str,
        session_id: &str,
    ) -> LedgerResult<Option<ReconciliationSession>> {
        self.store.get_session(organization_id, session_id).await
    }

    /// Run a match pass for the session against the current ledger state
    ///
    /// The result is recomputed every call; ledger transactions created since
    /// the import (manual entry, backfill) are picked up. When the pass finds
    /// zero unmatched statement entries and the policy allows, a pending
    /// session transitions to `Reconciled`.
    pub async fn match_result(
        &self,
        organization_id: &str,
        session_id: &str,
    ) -> LedgerResult<MatchResult> {
        let session = self.require_session(organization_id, session_id).await?;
        let result = self.run_match_pass(&session).await?;
        self.apply_reconciled_transition(&session, &result).await?;
        Ok(result)
    }

    /// Create ledger transactions for statement entries with no match
    ///
    /// Runs a fresh match pass, then backfills every unmatched statement
    /// entry, or only the given indices into that unmatched list. Each item
    /// carries a dedup key derived from the session and entry, so re-running
    /// after a partial failure skips what already committed instead of
    /// duplicating it. Per-item errors never abort the batch.
    pub async fn backfill_unmatched(
        &self,
        organization_id: &str,
        session_id: &str,
        selection: Option<&[usize]>,
    ) -> LedgerResult<BackfillReport> {
        let session = self.require_session(organization_id, session_id).await?;
        let unmatched = self
            .run_match_pass(&session)
            .await?
            .unmatched_statement_entries;

        let targets: Vec<StatementEntry> = match selection {
            Some(indices) => {
                if let Some(&bad) = indices.iter().find(|&&index| index >= unmatched.len()) {
                    return Err(LedgerError::Validation(format!(
                        "Backfill selection index {} out of range ({} unmatched entries)",
                        bad,
                        unmatched.len()
                    )));
                }
                indices.iter().map(|&index| unmatched[index].clone()).collect()
            }
            None => unmatched,
        };

        let mut report = BackfillReport::default();
        for entry in targets {
            let Some(direction) = entry.direction() else {
                warn!(session_id, date = %entry.date, "zero-amount entry cannot be backfilled");
                report.failed.push(BackfillFailure {
                    entry,
                    error: LedgerError::InvalidAmount(
                        "Statement entry amount is zero".to_string(),
                    ),
                });
                continue;
            };

            let dedup_key = backfill_dedup_key(&session.id, &entry);
            let created = self
                .ledger
                .create_transaction_with_dedup(
                    organization_id,
                    &session.account_id,
                    entry.absolute_amount(),
                    direction,
                    entry.date,
                    &entry.description,
                    &dedup_key,
                )
                .await;

            match created {
                Ok(transaction) => report.created.push(TransactionRef::from(&transaction)),
                Err(LedgerError::DuplicateBackfill(key)) => {
                    debug!(session_id, dedup_key = %key, "entry already backfilled, skipping");
                    report.skipped.push(BackfillSkip {
                        entry,
                        dedup_key: key,
                    });
                }
                Err(error) => {
                    warn!(session_id, date = %entry.date, %error, "backfill item failed");
                    report.failed.push(BackfillFailure { entry, error });
                }
            }
        }

        info!(
            organization_id,
            session_id,
            created = report.created.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "backfill pass finished"
        );

        // Re-evaluate the match so a now-complete session can transition.
        let after = self.run_match_pass(&session).await?;
        self.apply_reconciled_transition(&session, &after).await?;

        Ok(report)
    }

    async fn run_match_pass(
        &self,
        session: &ReconciliationSession,
    ) -> LedgerResult<MatchResult> {
        let candidates = self
            .store
            .list_account_transactions(
                &session.organization_id,
                &session.account_id,
                None,
                None,
            )
            .await?;
        Ok(match_statement(&session.statement_entries, &candidates))
    }

    async fn apply_reconciled_transition(
        &self,
        session: &ReconciliationSession,
        result: &MatchResult,
    ) -> LedgerResult<()> {
        if self.policy.auto_reconcile
            && session.status == SessionStatus::Pending
            && result.is_fully_matched()
        {
            self.store
                .update_session_status(
                    &session.organization_id,
                    &session.id,
                    SessionStatus::Reconciled,
                )
                .await?;
            info!(
                organization_id = %session.organization_id,
                session_id = %session.id,
                "session reconciled"
            );
        }
        Ok(())
    }

    async fn require_session(
        &self,
        organization_id: &str,
        session_id: &str,
    ) -> LedgerResult<ReconciliationSession> {
        self.store
            .get_session(organization_id, session_id)
            .await?
            .ok_or_else(|| LedgerError::SessionNotFound(session_id.to_string()))
    }
}

/// Deterministic dedup key for a backfilled statement entry
///
/// Derived from the session and the entry's stored fields; the session
/// snapshot is immutable, so retries always derive the same key.
pub fn backfill_dedup_key(session_id: &str, entry: &StatementEntry) -> String {
    format!(
        "backfill:{}:{}:{}:{}",
        session_id, entry.date, entry.amount, entry.description
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_store::MemoryStore;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;
    use std::str::FromStr;

    const ORG: &str = "org-1";
    const ACCT: &str = "acct";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn entry(date_: NaiveDate, amount: &str, description: &str) -> StatementEntry {
        StatementEntry::new(date_, dec(amount), description.to_string())
    }

    async fn service() -> ReconciliationService<MemoryStore> {
        let store = MemoryStore::new();
        store
            .insert_account(&Account::new(
                ACCT.to_string(),
                ORG.to_string(),
                "Operating".to_string(),
            ))
            .await
            .unwrap();
        ReconciliationService::new(store)
    }

    #[tokio::test]
    async fn session_snapshot_and_pending_status() {
        let service = service().await;
        let entries = vec![entry(date(2024, 1, 5), "-150.00", "CARD PAYMENT")];

        let session = service
            .create_session(ORG, ACCT, "january.ofx", entries.clone())
            .await
            .unwrap();
        assert_eq!(session.status, SessionStatus::Pending);
        assert_eq!(session.statement_entries, entries);

        let stored = service
            .get_session(ORG, &session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.statement_entries, entries);
    }

    #[tokio::test]
    async fn create_session_rejects_foreign_account() {
        let service = service().await;
        let result = service
            .create_session("org-2", ACCT, "january.ofx", Vec::new())
            .await;
        assert!(matches!(
            result,
            Err(LedgerError::CrossTenantAccess { .. })
        ));
    }

    #[tokio::test]
    async fn match_uses_current_ledger_state() {
        let service = service().await;
        let session = service
            .create_session(
                ORG,
                ACCT,
                "january.ofx",
                vec![entry(date(2024, 1, 5), "-150.00", "CARD PAYMENT")],
            )
            .await
            .unwrap();

        let before = service.match_result(ORG, &session.id).await.unwrap();
        assert_eq!(before.unmatched_statement_entries.len(), 1);

        // A manual entry after the import is picked up by the next pass.
        service
            .ledger()
            .create_transaction(
                ORG,
                ACCT,
                dec("150.00"),
                TransactionType::Expense,
                date(2024, 1, 5),
                "Manually entered card payment",
            )
            .await
            .unwrap();

        let after = service.match_result(ORG, &session.id).await.unwrap();
        assert_eq!(after.matched_pairs.len(), 1);
        assert!(after.unmatched_statement_entries.is_empty());

        let stored = service
            .get_session(ORG, &session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SessionStatus::Reconciled);
    }

    #[tokio::test]
    async fn auto_reconcile_can_be_disabled() {
        let store = MemoryStore::new();
        store
            .insert_account(&Account::new(
                ACCT.to_string(),
                ORG.to_string(),
                "Operating".to_string(),
            ))
            .await
            .unwrap();
        let service = ReconciliationService::with_policy(
            store,
            ReconciliationPolicy {
                auto_reconcile: false,
            },
        );

        let session = service
            .create_session(ORG, ACCT, "empty.ofx", Vec::new())
            .await
            .unwrap();
        let result = service.match_result(ORG, &session.id).await.unwrap();
        assert!(result.is_fully_matched());

        let stored = service
            .get_session(ORG, &session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SessionStatus::Pending);
    }

    #[tokio::test]
    async fn backfill_creates_missing_transactions_and_reconciles() {
        let service = service().await;
        let session = service
            .create_session(
                ORG,
                ACCT,
                "february.ofx",
                vec![entry(date(2024, 2, 10), "500.00", "CLIENT TRANSFER")],
            )
            .await
            .unwrap();

        let report = service
            .backfill_unmatched(ORG, &session.id, None)
            .await
            .unwrap();
        assert!(report.is_success());
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].transaction_type, TransactionType::Income);
        assert_eq!(report.created[0].amount, dec("500.00"));

        let account = service
            .ledger()
            .get_account(ORG, ACCT)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.balance, dec("500.00"));

        let stored = service
            .get_session(ORG, &session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SessionStatus::Reconciled);
    }

    #[tokio::test]
    async fn backfill_is_idempotent_across_reruns() {
        let store = MemoryStore::new();
        store
            .insert_account(&Account::new(
                ACCT.to_string(),
                ORG.to_string(),
                "Operating".to_string(),
            ))
            .await
            .unwrap();
        let service = ReconciliationService::with_policy(
            store.clone(),
            ReconciliationPolicy {
                auto_reconcile: false,
            },
        );

        let session = service
            .create_session(
                ORG,
                ACCT,
                "february.ofx",
                vec![
                    entry(date(2024, 2, 10), "500.00", "CLIENT TRANSFER"),
                    entry(date(2024, 2, 12), "-42.00", "SOFTWARE SUBSCRIPTION"),
                ],
            )
            .await
            .unwrap();

        let first = service
            .backfill_unmatched(ORG, &session.id, None)
            .await
            .unwrap();
        assert_eq!(first.created.len(), 2);

        let second = service
            .backfill_unmatched(ORG, &session.id, None)
            .await
            .unwrap();
        assert!(second.created.is_empty());
        assert!(second.failed.is_empty());

        let transactions = store
            .list_account_transactions(ORG, ACCT, None, None)
            .await
            .unwrap();
        assert_eq!(transactions.len(), 2);

        let account = store.get_account(ORG, ACCT).await.unwrap().unwrap();
        assert_eq!(account.balance, dec("458.00"));
    }

    #[tokio::test]
    async fn duplicate_identical_entries_share_a_dedup_key() {
        let service = service().await;
        // Two identical statement lines derive the same dedup key, so only
        // the first one is backfilled; the second is reported as a skip.
        let session = service
            .create_session(
                ORG,
                ACCT,
                "february.ofx",
                vec![
                    entry(date(2024, 2, 12), "-4.50", "COFFEE"),
                    entry(date(2024, 2, 12), "-4.50", "COFFEE"),
                ],
            )
            .await
            .unwrap();

        let report = service
            .backfill_unmatched(ORG, &session.id, None)
            .await
            .unwrap();
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.failed.is_empty());

        let account = service
            .ledger()
            .get_account(ORG, ACCT)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.balance, dec("-4.50"));
    }

    #[tokio::test]
    async fn backfill_selection_targets_a_subset() {
        let service = service().await;
        let session = service
            .create_session(
                ORG,
                ACCT,
                "march.ofx",
                vec![
                    entry(date(2024, 3, 1), "100.00", "TRANSFER A"),
                    entry(date(2024, 3, 2), "200.00", "TRANSFER B"),
                ],
            )
            .await
            .unwrap();

        let report = service
            .backfill_unmatched(ORG, &session.id, Some(&[1]))
            .await
            .unwrap();
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].amount, dec("200.00"));

        let stored = service
            .get_session(ORG, &session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SessionStatus::Pending);
    }

    #[tokio::test]
    async fn backfill_selection_out_of_range_fails_before_any_write() {
        let service = service().await;
        let session = service
            .create_session(
                ORG,
                ACCT,
                "march.ofx",
                vec![entry(date(2024, 3, 1), "100.00", "TRANSFER A")],
            )
            .await
            .unwrap();

        let result = service
            .backfill_unmatched(ORG, &session.id, Some(&[0, 5]))
            .await;
        assert!(matches!(result, Err(LedgerError::Validation(_))));

        let account = service
            .ledger()
            .get_account(ORG, ACCT)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.balance, BigDecimal::from(0));
    }

    #[tokio::test]
    async fn zero_amount_entry_is_reported_as_failed() {
        let service = service().await;
        let session = service
            .create_session(
                ORG,
                ACCT,
                "odd.ofx",
                vec![entry(date(2024, 4, 1), "0", "BALANCE NOTICE")],
            )
            .await
            .unwrap();

        let report = service
            .backfill_unmatched(ORG, &session.id, None)
            .await
            .unwrap();
        assert!(report.created.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(
            report.failed[0].error,
            LedgerError::InvalidAmount(_)
        ));
    }

    #[tokio::test]
    async fn unknown_session_is_an_error() {
        let service = service().await;
        let result = service.match_result(ORG, "missing").await;
        assert!(matches!(result, Err(LedgerError::SessionNotFound(_))));
    }
}
