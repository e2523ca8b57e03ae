//! # API Error Type
//!
//! Unified error type for query and command functions.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Fleetline                              │
//! │                                                                         │
//! │  Command Function  Result<T, ApiError>                                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Role check?      ─── no desk for role ───────────► PERMISSION_DENIED   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Domain rule?     ─── CoreError::InvalidDestination ► INVALID_DESTINATION│
//! │         │             CoreError::Validation ───────► INVALID_INPUT      │
//! │         ▼                                                               │
//! │  Database error?  ─── DbError::QueryFailed ────────► PERSISTENCE_FAILURE│
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Success ──────────────────────────────────────────────────────────────►│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed write has already rolled back by the time the caller sees the
//! error, so prior state is untouched.

use std::sync::Arc;

use serde::Serialize;
use tracing::error;

use fleetline_core::{AuthError, CoreError, ValidationError};
use fleetline_db::DbError;

/// Error returned from every query and command.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INVALID_DESTINATION",
///   "message": "Branch H2 is not a valid transfer destination from S1"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Unknown branch, head, sale record or catalog row
    NotFound,

    /// Input validation failed
    InvalidInput,

    /// Transfer target outside the sender's territory
    InvalidDestination,

    /// Fulfillment record in the wrong state
    InvalidTransition,

    /// Write would overdraw stock under the strict policy
    InsufficientStock,

    /// Database operation failed
    PersistenceFailure,

    /// Bad credentials or identity store unavailable
    AuthenticationError,

    /// The caller's role lacks the capability
    PermissionDenied,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::InvalidInput, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::PermissionDenied, message)
    }

    /// Creates a persistence error.
    pub fn persistence(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::PersistenceFailure, message)
    }
}

/// Converts core errors to API errors.
impl From<&CoreError> for ApiError {
    fn from(err: &CoreError) -> Self {
        let code = match err {
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::InvalidDestination { .. } => ErrorCode::InvalidDestination,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            CoreError::InvalidHierarchy(_) | CoreError::Validation(_) => ErrorCode::InvalidInput,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::from(&err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::new(ErrorCode::InvalidInput, CoreError::from(err).to_string())
    }
}

/// Converts database errors to API errors.
impl From<&DbError> for ApiError {
    fn from(err: &DbError) -> Self {
        match err {
            DbError::Core(core) => ApiError::from(core),
            DbError::NotFound { entity, id } => ApiError::not_found(entity, id),
            DbError::Duplicate { column } => {
                ApiError::invalid_input(format!("{} already exists", column))
            }
            DbError::UnknownReference(message) => {
                error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::NotFound, "Unknown branch or user reference")
            }
            DbError::ConstraintViolation(message) => ApiError::invalid_input(message.clone()),
            DbError::LedgerImmutable => ApiError::invalid_input(err.to_string()),
            DbError::ConnectionFailed(_) => ApiError::persistence("Database connection failed"),
            DbError::MigrationFailed(_) => ApiError::persistence("Database migration failed"),
            DbError::PoolExhausted => ApiError::persistence("Database pool exhausted"),
            DbError::QueryFailed(e) | DbError::Internal(e) => {
                // Log the actual error but return a generic message
                error!("Database operation failed: {}", e);
                ApiError::persistence("Database operation failed")
            }
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        ApiError::from(&err)
    }
}

/// Errors shared by concurrent cache loaders.
impl From<Arc<DbError>> for ApiError {
    fn from(err: Arc<DbError>) -> Self {
        ApiError::from(err.as_ref())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if let AuthError::Unavailable(ref reason) = err {
            error!("Identity provider unavailable: {}", reason);
        }
        ApiError::new(ErrorCode::AuthenticationError, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result alias for command functions.
pub type ApiResult<T> = Result<T, ApiError>;
