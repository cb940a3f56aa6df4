//! Input validation helpers

use bigdecimal::BigDecimal;

use crate::types::{LedgerError, LedgerResult};

/// Validate that a transaction amount is strictly positive
pub fn validate_positive_amount(amount: &BigDecimal) -> LedgerResult<()> {
    if *amount <= BigDecimal::from(0) {
        Err(LedgerError::InvalidAmount(format!(
            "Amount must be strictly positive, got {}",
            amount
        )))
    } else {
        Ok(())
    }
}

/// Validate a transaction description
///
/// Bank statement descriptions may be empty; only an upper bound is enforced.
pub fn validate_description(description: &str) -> LedgerResult<()> {
    if description.len() > 500 {
        return Err(LedgerError::Validation(
            "Description cannot exceed 500 characters".to_string(),
        ));
    }
    Ok(())
}

/// Validate the name of an imported statement file
pub fn validate_source_file_name(file_name: &str) -> LedgerResult<()> {
    if file_name.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Source file name cannot be empty".to_string(),
        ));
    }
    if file_name.len() > 255 {
        return Err(LedgerError::Validation(
            "Source file name cannot exceed 255 characters".to_string(),
        ));
    }
    Ok(())
}
