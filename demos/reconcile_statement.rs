//! Statement reconciliation walkthrough: import, match, backfill, reconcile

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::str::FromStr;

use ledger_core::{
    Account, LedgerResult, LedgerStore, MemoryStore, ReconciliationService, StatementEntry,
    StatementNormalizer, TenantContext, TenantResolver, TransactionType,
};

/// Toy normalizer for `date,amount,description` lines; a real deployment
/// plugs in an OFX/CSV parser here.
struct CsvNormalizer;

impl StatementNormalizer for CsvNormalizer {
    fn parse_statement(&self, raw_content: &str) -> LedgerResult<Vec<StatementEntry>> {
        let mut entries = Vec::new();
        for line in raw_content.lines().filter(|l| !l.trim().is_empty()) {
            let mut fields = line.splitn(3, ',');
            let date = fields
                .next()
                .and_then(|f| NaiveDate::from_str(f.trim()).ok());
            let amount = fields
                .next()
                .and_then(|f| BigDecimal::from_str(f.trim()).ok());
            let description = fields.next().unwrap_or("").trim().to_string();
            if let (Some(date), Some(amount)) = (date, amount) {
                entries.push(StatementEntry::new(date, amount, description));
            }
        }
        Ok(entries)
    }
}

/// Single-tenant stub; a real deployment resolves the actor's organization.
struct StaticTenantResolver;

#[async_trait]
impl TenantResolver for StaticTenantResolver {
    async fn resolve_tenant(&self, _actor_id: &str) -> LedgerResult<TenantContext> {
        Ok(TenantContext {
            organization_id: "demo-org".to_string(),
            role: "owner".to_string(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Ledger Core - Statement Reconciliation Example\n");

    let tenant = StaticTenantResolver.resolve_tenant("user-1").await?;
    let org = tenant.organization_id.as_str();

    let store = MemoryStore::new();
    store
        .insert_account(&Account::new(
            "operating".to_string(),
            org.to_string(),
            "Operating Account".to_string(),
        ))
        .await?;

    let reconciliation = ReconciliationService::new(store.clone());
    let ledger = reconciliation.ledger();

    // The bookkeeper already entered one expense by hand.
    ledger
        .create_transaction(
            org,
            "operating",
            BigDecimal::from_str("150.00")?,
            TransactionType::Expense,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            "Office chair",
        )
        .await?;
    println!("Recorded manual expense of 150.00");

    // Import the January bank statement.
    let raw_statement = "\
        2024-01-05,-150.00,CARD PAYMENT 4421\n\
        2024-01-20,2500.00,CLIENT TRANSFER ACME\n\
        2024-01-28,-42.00,SOFTWARE SUBSCRIPTION\n";
    let entries = CsvNormalizer.parse_statement(raw_statement)?;
    let session = reconciliation
        .create_session(org, "operating", "january.csv", entries)
        .await?;
    println!(
        "Imported {} statement entries into session {}\n",
        session.statement_entries.len(),
        session.id
    );

    // First match pass: the card payment is covered, the rest is not.
    let result = reconciliation.match_result(org, &session.id).await?;
    println!(
        "Match pass: {} matched, {} unmatched statement entries",
        result.matched_pairs.len(),
        result.unmatched_statement_entries.len()
    );
    for entry in &result.unmatched_statement_entries {
        println!("  missing from ledger: {} {} {}", entry.date, entry.amount, entry.description);
    }
    println!();

    // Backfill the gaps and show the report.
    let report = reconciliation
        .backfill_unmatched(org, &session.id, None)
        .await?;
    println!(
        "Backfill: {} created, {} skipped, {} failed",
        report.created.len(),
        report.skipped.len(),
        report.failed.len()
    );
    for created in &report.created {
        println!(
            "  created {:?} of {} on {}",
            created.transaction_type, created.amount, created.date
        );
    }
    println!();

    let account = store.get_account(org, "operating").await?.unwrap();
    println!("Final balance: {}", account.balance);

    let session = store.get_session(org, &session.id).await?.unwrap();
    println!("Session status: {:?}", session.status);

    Ok(())
}
