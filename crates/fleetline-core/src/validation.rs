//! # Validation Module
//!
//! Input validation for ledger writes and fulfillment updates.
//!
//! ## Where Validation Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Batch accumulator (apps/ops session)                         │
//! │  └── validate_quantity on every add_to_batch                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Posting plans (fleetline-core::posting)                      │
//! │  └── THIS MODULE: ids, descriptors, reasons, chassis numbers           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (transaction_type, quantity > 0)                │
//! │  └── Foreign keys to branches                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use fleetline_core::validation::{validate_branch_id, validate_quantity};
//!
//! validate_branch_id("H1").unwrap();
//! validate_quantity(5).unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::DateRange;
use crate::{MAX_ADJUSTMENT_QUANTITY, MAX_BATCH_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted branch identifier.
pub const MAX_BRANCH_ID_LEN: usize = 10;

/// Longest accepted free-text remark.
pub const MAX_REMARKS_LEN: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

/// Rejects empty (after trimming) values and returns the trimmed text.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(value.to_string())
}

/// Validates a branch identifier.
///
/// ## Rules
/// - Must not be empty
/// - At most 10 characters
/// - Letters, digits, hyphens and underscores only
pub fn validate_branch_id(branch_id: &str) -> ValidationResult<()> {
    let branch_id = validate_required("branch_id", branch_id)?;

    if branch_id.chars().count() > MAX_BRANCH_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "branch_id".to_string(),
            max: MAX_BRANCH_ID_LEN,
        });
    }

    if !branch_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "branch_id".to_string(),
            reason: "must contain only letters, digits, hyphens and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates free-text remarks. Empty is fine.
pub fn validate_remarks(remarks: &str) -> ValidationResult<()> {
    if remarks.chars().count() > MAX_REMARKS_LEN {
        return Err(ValidationError::TooLong {
            field: "remarks".to_string(),
            max: MAX_REMARKS_LEN,
        });
    }
    Ok(())
}

/// Validates the reason text of a manual adjustment.
///
/// ## Returns
/// The trimmed reason.
pub fn validate_adjustment_reason(reason: &str) -> ValidationResult<String> {
    let reason = validate_required("reason", reason)?;
    validate_remarks(&reason)?;
    Ok(reason)
}

/// Validates a chassis number captured at PDI completion.
///
/// ## Returns
/// The trimmed, uppercased chassis number.
pub fn validate_chassis_no(chassis_no: &str) -> ValidationResult<String> {
    let chassis_no = validate_required("chassis_no", chassis_no)?;

    if chassis_no.len() > 30 {
        return Err(ValidationError::TooLong {
            field: "chassis_no".to_string(),
            max: 30,
        });
    }

    Ok(chassis_no.to_uppercase())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates one batch line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a counted stock quantity entered for an adjustment.
///
/// ## Rules
/// - Zero or more
/// - At most MAX_ADJUSTMENT_QUANTITY
pub fn validate_stock_count(count: i64) -> ValidationResult<()> {
    if !(0..=MAX_ADJUSTMENT_QUANTITY).contains(&count) {
        return Err(ValidationError::OutOfRange {
            field: "new_quantity".to_string(),
            min: 0,
            max: MAX_ADJUSTMENT_QUANTITY,
        });
    }
    Ok(())
}

/// Validates the signed quantity of one adjustment row.
pub fn validate_adjustment_delta(delta: i64) -> ValidationResult<()> {
    if delta.unsigned_abs() > MAX_ADJUSTMENT_QUANTITY.unsigned_abs() {
        return Err(ValidationError::OutOfRange {
            field: "delta".to_string(),
            min: -MAX_ADJUSTMENT_QUANTITY,
            max: MAX_ADJUSTMENT_QUANTITY,
        });
    }
    Ok(())
}

/// Validates the number of lines in a submitted batch.
pub fn validate_batch_len(len: usize) -> ValidationResult<()> {
    if len == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }
    if len > MAX_BATCH_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_BATCH_ITEMS as i64,
        });
    }
    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Builds a [`DateRange`] from optional bounds.
///
/// Both bounds missing means "no range". One bound alone is rejected.
pub fn validate_date_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> ValidationResult<Option<DateRange>> {
    match (start, end) {
        (None, None) => Ok(None),
        (Some(start), Some(end)) if start <= end => Ok(Some(DateRange { start, end })),
        (Some(start), Some(end)) => Err(ValidationError::InvalidFormat {
            field: "date_range".to_string(),
            reason: format!("start {} is after end {}", start, end),
        }),
        _ => Err(ValidationError::InvalidFormat {
            field: "date_range".to_string(),
            reason: "both start and end are required".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_branch_id() {
        assert!(validate_branch_id("H1").is_ok());
        assert!(validate_branch_id("SUB_01").is_ok());
        assert!(validate_branch_id("").is_err());
        assert!(validate_branch_id("   ").is_err());
        assert!(validate_branch_id("ABCDEFGHIJK").is_err());
        assert!(validate_branch_id("H 1").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(matches!(
            validate_quantity(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_quantity(-2).is_err());
        assert!(matches!(
            validate_quantity(1000),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_adjustment_limits() {
        assert!(validate_stock_count(0).is_ok());
        assert!(validate_stock_count(MAX_ADJUSTMENT_QUANTITY).is_ok());
        assert!(validate_stock_count(-1).is_err());
        assert!(matches!(
            validate_stock_count(i64::MAX),
            Err(ValidationError::OutOfRange { .. })
        ));

        assert!(validate_adjustment_delta(-MAX_ADJUSTMENT_QUANTITY).is_ok());
        assert!(validate_adjustment_delta(MAX_ADJUSTMENT_QUANTITY + 1).is_err());
        assert!(validate_adjustment_delta(i64::MIN).is_err());
    }

    #[test]
    fn test_validate_batch_len() {
        assert!(validate_batch_len(0).is_err());
        assert!(validate_batch_len(1).is_ok());
        assert!(validate_batch_len(MAX_BATCH_ITEMS).is_ok());
        assert!(validate_batch_len(MAX_BATCH_ITEMS + 1).is_err());
    }

    #[test]
    fn test_validate_chassis_no_normalizes() {
        assert_eq!(validate_chassis_no("  ch12345 ").unwrap(), "CH12345");
        assert!(validate_chassis_no("").is_err());
        assert!(validate_chassis_no(&"X".repeat(31)).is_err());
    }

    #[test]
    fn test_validate_adjustment_reason() {
        assert_eq!(
            validate_adjustment_reason(" damaged unit ").unwrap(),
            "damaged unit"
        );
        assert!(validate_adjustment_reason("  ").is_err());
    }

    #[test]
    fn test_validate_date_range() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(validate_date_range(None, None).unwrap(), None);
        assert!(validate_date_range(Some(a), Some(b)).unwrap().is_some());
        assert!(validate_date_range(Some(b), Some(a)).is_err());
        assert!(validate_date_range(Some(a), None).is_err());
    }
}
