//! # User Repository
//!
//! Staff accounts with argon2 password hashes. Implements
//! [`IdentityProvider`] so the app layer can authenticate against SQLite
//! without knowing how credentials are stored.

use sqlx::{FromRow, SqlitePool};
use tracing::{info, warn};

use fleetline_core::validation::validate_required;
use fleetline_core::{AuthError, Identity, IdentityProvider, Role};

use crate::error::{DbError, DbResult};

#[derive(Debug, FromRow)]
struct UserRow {
    username: String,
    password_hash: String,
    role: Role,
    branch_id: Option<String>,
}

impl UserRow {
    fn identity(self) -> Identity {
        Identity {
            username: self.username,
            role: self.role,
            branch_id: self.branch_id,
        }
    }
}

/// Repository for staff accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates an account, storing only the argon2 hash of `password`.
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        role: Role,
        branch_id: Option<&str>,
    ) -> DbResult<Identity> {
        let username = validate_required("username", username)?;
        validate_required("password", password)?;
        let hash = hash_password(password)?;

        sqlx::query(
            "INSERT INTO users (username, password_hash, role, branch_id) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&username)
        .bind(&hash)
        .bind(role)
        .bind(branch_id)
        .execute(&self.pool)
        .await?;

        info!(username = %username, role = %role, "User created");
        Ok(Identity {
            username,
            role,
            branch_id: branch_id.map(str::to_string),
        })
    }

    /// Looks up an account without checking a password.
    pub async fn find(&self, username: &str) -> DbResult<Option<Identity>> {
        Ok(self.row(username).await?.map(UserRow::identity))
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn row(&self, username: &str) -> DbResult<Option<UserRow>> {
        let row = sqlx::query_as(
            "SELECT username, password_hash, role, branch_id FROM users WHERE username = ?1",
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

impl IdentityProvider for UserRepository {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        let row = self
            .row(username)
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        match row {
            Some(row) if verify_password(password, &row.password_hash) => Ok(row.identity()),
            _ => {
                warn!(username = %username.trim(), "Authentication failed");
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Verify a password against its stored hash.
fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Hash a password for storage.
pub fn hash_password(password: &str) -> DbResult<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_authenticate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();
        users.create("mech_a", "spanner", Role::Mechanic, None).await.unwrap();

        let identity = users.authenticate("mech_a", "spanner").await.unwrap();
        assert_eq!(identity.role, Role::Mechanic);

        assert!(matches!(
            users.authenticate("mech_a", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            users.authenticate("ghost", "spanner").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_hash_is_not_plaintext() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users().create("owner1", "secret", Role::Owner, None).await.unwrap();

        let stored: String =
            sqlx::query_scalar("SELECT password_hash FROM users WHERE username = 'owner1'")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert!(stored.starts_with("$argon2"));
        assert_eq!(db.users().count().await.unwrap(), 1);
        assert_eq!(db.users().find("owner1").await.unwrap().unwrap().role, Role::Owner);
    }
}
