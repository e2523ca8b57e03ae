//! # State Module
//!
//! Process-wide and per-session state for the ops surface.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  process-wide                          per session                      │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────────────┐   │
//! │  │   DbState    │  │ MasterDataCache  │  │      SessionState        │   │
//! │  │              │  │                  │  │                          │   │
//! │  │  Database    │  │  hierarchy       │  │  identity                │   │
//! │  │  StockPolicy │  │  catalog         │  │  inward / transfer /     │   │
//! │  │  recent cap  │  │  (moka, TTL)     │  │  sales batches (Mutex)   │   │
//! │  └──────────────┘  └──────────────────┘  └──────────────────────────┘   │
//! │                                                                         │
//! │  THREAD SAFETY:                                                         │
//! │  • DbState: SqlitePool is internally synchronized                       │
//! │  • MasterDataCache: moka is concurrent; invalidated after every write   │
//! │  • SessionState: std Mutex, never held across an await                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod db;
mod master;
mod session;

pub use db::DbState;
pub use master::MasterDataCache;
pub use session::{ComplianceDesk, MechanicDesk, OpsDesk, SessionState};
