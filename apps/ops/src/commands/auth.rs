//! # Auth Commands
//!
//! Sign a session in against an [`IdentityProvider`], or out again.

use tracing::{debug, warn};

use fleetline_core::{Identity, IdentityProvider};

use crate::error::ApiResult;
use crate::state::SessionState;

/// Verifies the credentials and binds the identity to the session.
///
/// ## Errors
/// `AuthenticationError` for bad credentials or an unreachable store. The
/// previous identity, if any, stays signed in.
pub async fn login<P: IdentityProvider>(
    provider: &P,
    session: &SessionState,
    username: &str,
    password: &str,
) -> ApiResult<Identity> {
    debug!(username = %username, "login command");
    let identity = match provider.authenticate(username, password).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!(username = %username, error = %e, "Login failed");
            return Err(e.into());
        }
    };
    session.sign_in(identity.clone());
    Ok(identity)
}

/// Forgets the identity and discards every batch.
pub fn logout(session: &SessionState) {
    session.sign_out();
}

pub fn current_identity(session: &SessionState) -> Option<Identity> {
    session.identity()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::fixture;
    use crate::error::ErrorCode;
    use fleetline_core::Role;

    #[tokio::test]
    async fn test_login_logout() {
        let (db, _, _) = fixture(Role::Owner).await;
        db.inner()
            .users()
            .create("pdi1", "secret", Role::Pdi, Some("H1"))
            .await
            .unwrap();

        let session = SessionState::new();
        let err = login(&db.inner().users(), &session, "pdi1", "wrong")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthenticationError);
        assert!(current_identity(&session).is_none());

        let identity = login(&db.inner().users(), &session, "pdi1", "secret")
            .await
            .unwrap();
        assert_eq!(identity.role, Role::Pdi);
        assert_eq!(identity.branch_id.as_deref(), Some("H1"));
        assert!(session.ops_desk().is_ok());

        logout(&session);
        assert!(current_identity(&session).is_none());
        assert!(session.ops_desk().is_err());
    }
}
