//! # Error Types
//!
//! ```text
//! ValidationError ──► CoreError ──► DbError (fleetline-db) ──► ApiError (apps/ops)
//!   bad input          rule broken     persistence               { code, message }
//! ```
//!
//! The db layer wraps core errors unchanged in `DbError::Core`.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// A domain rule rejected the operation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A branch, head branch or sale record id is unknown.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Transfer target is outside the sender's managed branch set.
    ///
    /// ## When This Occurs
    /// ```text
    /// H1 manages {H1, S1, S2}
    ///
    /// transfer(S1 → S2)   OK (same territory)
    /// transfer(S1 → H2)   InvalidDestination
    /// transfer(S1 → S1)   InvalidDestination
    /// ```
    #[error("Branch {to} is not a valid transfer destination from {from}")]
    InvalidDestination { from: String, to: String },

    /// Stock would go below zero under the strict stock policy.
    #[error(
        "Insufficient stock of {descriptor} at {branch_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        branch_id: String,
        descriptor: String,
        available: i64,
        requested: i64,
    },

    /// Fulfillment record is not in a state that allows the operation.
    ///
    /// ## When This Occurs
    /// - Assigning a mechanic to a sale that is already in progress
    /// - Completing PDI twice
    #[error("Sale {sale_id} is '{current_status}', cannot {operation}")]
    InvalidTransition {
        sale_id: i64,
        current_status: String,
        operation: String,
    },

    /// Hierarchy edges would create more than two levels or a self-loop.
    #[error("Invalid branch hierarchy: {0}")]
    InvalidHierarchy(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Rejected input, raised before any row is planned.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Blank after trimming (descriptor part, reason, chassis number,
    /// mechanic) or an empty batch.
    #[error("{field} is required")]
    Required { field: String },

    /// Branch id over 10 characters, remarks over 500.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Line quantity over 999 or a batch over 100 lines.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Zero or negative line quantity.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Inverted or half-open date range, inward source equal to its
    /// destination, malformed branch id.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Unknown role or fulfillment status string.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            branch_id: "S1".to_string(),
            descriptor: "ACTIVA/STD/RED".to_string(),
            available: 1,
            requested: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock of ACTIVA/STD/RED at S1: available 1, requested 2"
        );

        let err = CoreError::InvalidTransition {
            sale_id: 7,
            current_status: "PDI Complete".to_string(),
            operation: "complete PDI".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Sale 7 is 'PDI Complete', cannot complete PDI"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "chassis_no".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "Validation error: chassis_no is required");
    }
}
