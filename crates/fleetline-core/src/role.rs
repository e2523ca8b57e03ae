//! # Roles and Identity
//!
//! Closed set of staff roles, the capabilities each one carries, and the
//! seam through which an identity provider authenticates users.
//!
//! ## Role → Desk
//! ```text
//! ┌──────────────┬───────────────┬──────────────────────────────────────────┐
//! │ Role         │ Desk          │ Operations                               │
//! ├──────────────┼───────────────┼──────────────────────────────────────────┤
//! │ Owner        │ Ops           │ stock moves, adjustments, PDI assignment │
//! │              │ + Compliance  │ compliance flags                         │
//! │ PDI          │ Ops           │ stock moves, adjustments, PDI assignment │
//! │ Mechanic     │ Mechanic      │ own PDI queue, complete own PDI          │
//! │ Back Office  │ Compliance    │ compliance flags                         │
//! └──────────────┴───────────────┴──────────────────────────────────────────┘
//!  Public stock view: no login.
//! ```

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::error::ValidationError;

/// A staff role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum Role {
    Owner,
    #[serde(rename = "PDI")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "PDI"))]
    Pdi,
    Mechanic,
    #[serde(rename = "Back Office")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Back Office"))]
    BackOffice,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Owner, Role::Pdi, Role::Mechanic, Role::BackOffice];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "Owner",
            Role::Pdi => "PDI",
            Role::Mechanic => "Mechanic",
            Role::BackOffice => "Back Office",
        }
    }

    /// Inward, transfer, sale submissions and manual adjustments.
    pub fn can_move_stock(&self) -> bool {
        matches!(self, Role::Owner | Role::Pdi)
    }

    /// Assigning mechanics and viewing every in-progress PDI task.
    pub fn can_manage_pdi(&self) -> bool {
        matches!(self, Role::Owner | Role::Pdi)
    }

    /// Completing PDI on tasks assigned to oneself.
    pub fn can_complete_pdi(&self) -> bool {
        matches!(self, Role::Mechanic)
    }

    pub fn can_update_compliance(&self) -> bool {
        matches!(self, Role::Owner | Role::BackOffice)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: Role::ALL.iter().map(|r| r.as_str().to_string()).collect(),
            })
    }
}

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Identity {
    pub username: String,
    pub role: Role,
    /// Home branch, when the user is tied to one.
    pub branch_id: Option<String>,
}

/// Authentication failures.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown user or wrong password. Deliberately indistinguishable.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The identity store could not be reached or returned bad data.
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Verifies credentials and resolves the caller's identity.
pub trait IdentityProvider: Send + Sync {
    fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<Identity, AuthError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_strings() {
        assert_eq!("back office".parse::<Role>().unwrap(), Role::BackOffice);
        assert_eq!("PDI".parse::<Role>().unwrap(), Role::Pdi);
        assert!("Cashier".parse::<Role>().is_err());
        assert_eq!(serde_json::to_string(&Role::BackOffice).unwrap(), "\"Back Office\"");
    }

    #[test]
    fn test_capabilities() {
        assert!(Role::Owner.can_move_stock());
        assert!(Role::Pdi.can_manage_pdi());
        assert!(!Role::Mechanic.can_move_stock());
        assert!(Role::Mechanic.can_complete_pdi());
        assert!(!Role::Pdi.can_complete_pdi());
        assert!(Role::BackOffice.can_update_compliance());
        assert!(Role::Owner.can_update_compliance());
        assert!(!Role::BackOffice.can_move_stock());
    }
}
