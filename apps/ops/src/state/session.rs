//! # Session State
//!
//! One logged-in user: their identity and three batch accumulators.
//!
//! ## Desks
//! ```text
//! ┌────────────────┬───────────────────────────────────────────────────────┐
//! │ Desk           │ Granted to                                            │
//! ├────────────────┼───────────────────────────────────────────────────────┤
//! │ OpsDesk        │ Owner, PDI          stock moves, adjustments, PDI     │
//! │ MechanicDesk   │ Mechanic            own PDI queue, complete own PDI   │
//! │ ComplianceDesk │ Owner, Back Office  compliance flags                  │
//! └────────────────┴───────────────────────────────────────────────────────┘
//! ```
//! A desk is a capability token: commands that need one take it as an
//! argument, so an unauthorized call cannot be written.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use fleetline_core::{BatchItem, BatchKind, Identity, Role, VehicleBatch};

use crate::error::{ApiError, ApiResult};

/// Stock movements, adjustments and PDI assignment.
#[derive(Debug, Clone)]
pub struct OpsDesk {
    identity: Identity,
}

/// A mechanic's own PDI tasks.
#[derive(Debug, Clone)]
pub struct MechanicDesk {
    identity: Identity,
}

/// Insurance, TR, dues and tax flags.
#[derive(Debug, Clone)]
pub struct ComplianceDesk {
    identity: Identity,
}

macro_rules! desk_accessors {
    ($($desk:ty),*) => {$(
        impl $desk {
            pub fn identity(&self) -> &Identity {
                &self.identity
            }

            /// Username recorded as the actor of writes from this desk.
            pub fn actor(&self) -> &str {
                &self.identity.username
            }
        }
    )*};
}

desk_accessors!(OpsDesk, MechanicDesk, ComplianceDesk);

/// Per-session state.
#[derive(Debug, Default)]
pub struct SessionState {
    identity: Mutex<Option<Identity>>,
    batches: Mutex<BTreeMap<BatchKind, VehicleBatch>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionState {
    /// Creates an anonymous session (public stock view only).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, identity: Identity) {
        info!(username = %identity.username, role = %identity.role, "Signed in");
        *lock(&self.identity) = Some(identity);
    }

    /// Forgets the identity and discards every batch.
    pub fn sign_out(&self) {
        if let Some(identity) = lock(&self.identity).take() {
            info!(username = %identity.username, "Signed out");
        }
        lock(&self.batches).clear();
    }

    pub fn identity(&self) -> Option<Identity> {
        lock(&self.identity).clone()
    }

    fn require(&self, allowed: impl Fn(&Role) -> bool, desk: &str) -> ApiResult<Identity> {
        let identity = self
            .identity()
            .ok_or_else(|| ApiError::permission_denied("Sign in required"))?;
        if !allowed(&identity.role) {
            warn!(username = %identity.username, role = %identity.role, desk, "Desk refused");
            return Err(ApiError::permission_denied(format!(
                "{} role cannot use the {} desk",
                identity.role, desk
            )));
        }
        Ok(identity)
    }

    pub fn ops_desk(&self) -> ApiResult<OpsDesk> {
        let identity = self.require(Role::can_move_stock, "ops")?;
        Ok(OpsDesk { identity })
    }

    pub fn mechanic_desk(&self) -> ApiResult<MechanicDesk> {
        let identity = self.require(Role::can_complete_pdi, "mechanic")?;
        Ok(MechanicDesk { identity })
    }

    pub fn compliance_desk(&self) -> ApiResult<ComplianceDesk> {
        let identity = self.require(Role::can_update_compliance, "compliance")?;
        Ok(ComplianceDesk { identity })
    }

    // =========================================================================
    // Batches
    // =========================================================================

    /// Executes a function with write access to one batch.
    pub fn with_batch_mut<F, R>(&self, kind: BatchKind, f: F) -> R
    where
        F: FnOnce(&mut VehicleBatch) -> R,
    {
        let mut batches = lock(&self.batches);
        f(batches.entry(kind).or_default())
    }

    /// Copy of one batch.
    pub fn batch(&self, kind: BatchKind) -> VehicleBatch {
        lock(&self.batches).get(&kind).cloned().unwrap_or_default()
    }

    /// Removes the written lines after a successful submit. Lines added
    /// while the write was in flight are kept.
    pub fn settle_batch(&self, kind: BatchKind, submitted: &[BatchItem]) {
        debug!(%kind, lines = submitted.len(), "Settling submitted batch lines");
        lock(&self.batches)
            .entry(kind)
            .or_default()
            .subtract(submitted);
    }

    pub fn clear_batch(&self, kind: BatchKind) {
        debug!(%kind, "Clearing batch");
        lock(&self.batches).remove(&kind);
    }
}
