//! # Database Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error                        CoreError (posting / hierarchy)     │
//! │       │                                  │                              │
//! │       ▼  by ErrorKind                    ▼                              │
//! │  DbError ◄───────────────────────── DbError::Core                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (apps/ops)                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed write always leaves the ledger untouched: the orchestrator's
//! transaction is dropped (rolled back) before the error reaches the caller.

use fleetline_core::{CoreError, ValidationError};
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Message raised by the append-only triggers on `inventory_transactions`.
const APPEND_ONLY_MESSAGE: &str = "append-only";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A second branch with the same id, a second parent for a sub-branch,
    /// a second price row for one model and variant, a taken username.
    #[error("Duplicate {column}")]
    Duplicate { column: String },

    /// A row named a branch (or user) that does not exist.
    #[error("Unknown reference: {0}")]
    UnknownReference(String),

    /// UPDATE or DELETE attempted on a ledger row.
    #[error("Ledger rows cannot be changed once written")]
    LedgerImmutable,

    /// A CHECK constraint rejected the row (bad quantity sign, unknown
    /// transaction type, status or role).
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Every pooled connection stayed busy past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A domain rule rejected the operation before anything was written.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// ## Error Mapping
/// ```text
/// RowNotFound                        → NotFound
/// Database, UniqueViolation          → Duplicate { "branches.branch_id" }
/// Database, ForeignKeyViolation      → UnknownReference
/// Database, CheckViolation           → ConstraintViolation
/// Database, trigger "append-only"    → LedgerImmutable
/// PoolTimedOut                       → PoolExhausted
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => DbError::Duplicate {
                        column: msg
                            .rsplit(": ")
                            .next()
                            .unwrap_or("value")
                            .to_string(),
                    },
                    ErrorKind::ForeignKeyViolation => DbError::UnknownReference(msg.to_string()),
                    ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                        DbError::ConstraintViolation(msg.to_string())
                    }
                    _ if msg.contains(APPEND_ONLY_MESSAGE) => DbError::LedgerImmutable,
                    _ => DbError::QueryFailed(msg.to_string()),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Core(err.into())
    }
}

pub type DbResult<T> = Result<T, DbError>;
