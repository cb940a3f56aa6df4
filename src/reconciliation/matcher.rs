//! Pure greedy matcher for statement entries against ledger transactions
//!
//! No I/O and no side effects: the inputs are never mutated and the same
//! inputs always produce the same partition.

use bigdecimal::BigDecimal;

use crate::types::{MatchResult, MatchedPair, StatementEntry, Transaction};

/// Currency rounding tolerance for amount equality: strictly less than 0.01
pub fn amount_tolerance() -> BigDecimal {
    BigDecimal::new(1.into(), 2)
}

/// Match statement entries against candidate ledger transactions
///
/// Greedy first-fit: statement entries are walked in imported order, and each
/// claims the first remaining candidate (in candidate order) with the same
/// calendar date, an amount within [`amount_tolerance`] of the entry's
/// unsigned amount, and the direction implied by the entry's sign. A claimed
/// candidate leaves the pool, so no transaction satisfies two entries. Ties
/// go to the earliest remaining candidate; there is no ranking by amount
/// distance.
///
/// The output always partitions both inputs:
/// `matched + unmatched_statement_entries == entries` and
/// `matched + unmatched_transactions == candidates`.
pub fn match_statement(
    entries: &[StatementEntry],
    candidates: &[Transaction],
) -> MatchResult {
    let tolerance = amount_tolerance();
    let mut claimed = vec![false; candidates.len()];
    let mut matched_pairs = Vec::new();
    let mut unmatched_statement_entries = Vec::new();

    for entry in entries {
        // A zero amount implies no direction and can never match.
        let Some(direction) = entry.direction() else {
            unmatched_statement_entries.push(entry.clone());
            continue;
        };
        let entry_amount = entry.absolute_amount();

        let found = candidates.iter().enumerate().find(|(index, candidate)| {
            !claimed[*index]
                && candidate.transaction_type == direction
                && candidate.date == entry.date
                && (&candidate.amount - &entry_amount).abs() < tolerance
        });

        match found {
            Some((index, candidate)) => {
                claimed[index] = true;
                matched_pairs.push(MatchedPair {
                    entry: entry.clone(),
                    transaction: candidate.clone(),
                });
            }
            None => unmatched_statement_entries.push(entry.clone()),
        }
    }

    let unmatched_transactions = candidates
        .iter()
        .zip(&claimed)
        .filter(|(_, claimed)| !**claimed)
        .map(|(candidate, _)| candidate.clone())
        .collect();

    MatchResult {
        matched_pairs,
        unmatched_statement_entries,
        unmatched_transactions,
    }
}
