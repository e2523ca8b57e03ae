//! # Database State
//!
//! Wraps the `Database` together with the ledger settings every write
//! needs.

use fleetline_core::StockPolicy;
use fleetline_db::{Database, TransferOrchestrator};

use crate::config::OpsConfig;

#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
    policy: StockPolicy,
    recent_limit: u32,
}

impl DbState {
    pub fn new(db: Database, config: &OpsConfig) -> Self {
        DbState {
            db,
            policy: config.stock_policy(),
            recent_limit: config.ledger.recent_limit,
        }
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }

    /// Writer bound to the configured stock policy.
    pub fn orchestrator(&self) -> TransferOrchestrator {
        self.db.orchestrator(self.policy)
    }

    pub fn policy(&self) -> StockPolicy {
        self.policy
    }

    pub fn recent_limit(&self) -> u32 {
        self.recent_limit
    }
}
