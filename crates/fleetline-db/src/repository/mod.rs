//! # Repository Module
//!
//! Database repository implementations for Fleetline.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Command layer                                                          │
//! │       │  db.stock().multi_branch_stock(&ids, None)                     │
//! │       ▼                                                                 │
//! │  StockRepository ──► SQL (CASE sign expression) ──► SQLite             │
//! │                                                                         │
//! │  Reads use the pool directly. Writes to the ledger go through          │
//! │  TransferOrchestrator, which reuses the `*_on(conn, ..)` helpers       │
//! │  here inside its own transaction.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`branch::BranchRepository`] - Branch registry and hierarchy
//! - [`ledger::LedgerRepository`] - Ledger reads, audit, transfer summary
//! - [`stock::StockRepository`] - Net stock projection
//! - [`catalog::CatalogRepository`] - Vehicle catalog and prices
//! - [`sales_record::SalesRecordRepository`] - Fulfillment workflow
//! - [`user::UserRepository`] - Users and the bundled identity provider

pub mod branch;
pub mod catalog;
pub mod ledger;
pub mod sales_record;
pub mod stock;
pub mod user;
