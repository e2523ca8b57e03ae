//! # fleetline-db: Database Layer for Fleetline
//!
//! SQLite persistence for the dealership inventory ledger, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Fleetline Data Flow                              │
//! │                                                                         │
//! │  apps/ops command (submit_transfer)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                   fleetline-db (THIS CRATE)                     │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌──────────────┐     │    │
//! │  │   │   Database    │   │  Orchestrator  │   │  Migrations  │     │    │
//! │  │   │   (pool.rs)   │◄──│  (writes)      │   │  (embedded)  │     │    │
//! │  │   │               │   ├────────────────┤   │              │     │    │
//! │  │   │ SqlitePool    │◄──│  Repositories  │   │ 001_initial  │     │    │
//! │  │   │ WAL + FKs     │   │  (reads)       │   │              │     │    │
//! │  │   └───────────────┘   └────────────────┘   └──────────────┘     │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │  SQLite: inventory_transactions (append-only), branches, ...    │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Read repositories and master data
//! - [`orchestrator`] - Atomic ledger writes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fleetline_db::{Database, DbConfig};
//! use fleetline_core::StockPolicy;
//!
//! let db = Database::new(DbConfig::new("fleetline.db")).await?;
//!
//! db.orchestrator(StockPolicy::AllowNegative)
//!     .record_transfer("H1", "S1", date, "", &items)
//!     .await?;
//! let lines = db.stock().multi_branch_stock(&["H1".into(), "S1".into()], None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod orchestrator;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use orchestrator::TransferOrchestrator;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::branch::BranchRepository;
pub use repository::catalog::CatalogRepository;
pub use repository::ledger::LedgerRepository;
pub use repository::sales_record::SalesRecordRepository;
pub use repository::stock::StockRepository;
pub use repository::user::UserRepository;
