//! # fleetline-core: Pure Business Logic for Fleetline
//!
//! This crate is the **heart** of Fleetline. It holds the vehicle stock
//! ledger rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Fleetline Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Stock View / Ops Frontend                       │   │
//! │  │    Territory stock ──► Inward ──► Transfer ──► Sales ──► PDI    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/ops (commands, desks)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ fleetline-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌──────────┐ ┌───────────┐ ┌──────────────────┐   │   │
//! │  │  │ ledger  │ │ posting  │ │ hierarchy │ │   fulfillment    │   │   │
//! │  │  │ signs   │ │ pairs    │ │ head/sub  │ │   PDI → TR       │   │   │
//! │  │  └─────────┘ └──────────┘ └───────────┘ └──────────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                fleetline-db (Database Layer)                    │   │
//! │  │          SQLite ledger, orchestrator, repositories              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Branch, VehicleDescriptor, InventoryTransaction, ...)
//! - [`ledger`] - Sign convention and the in-memory reference ledger
//! - [`posting`] - Turns user intents into ledger rows (double-entry pairs)
//! - [`projection`] - Stock snapshot drill-down (model → variant → color)
//! - [`hierarchy`] - Head / sub-branch resolution
//! - [`fulfillment`] - Sale fulfillment state machine
//! - [`batch`] - Per-session line item accumulators
//! - [`role`] - Roles, capabilities and the identity provider seam
//! - [`catalog`] - Vehicle catalog tree and price breakdown
//! - [`money`] - Integer minor-unit amounts for catalog prices
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use fleetline_core::ledger::Ledger;
//! use fleetline_core::posting::{plan_inward, InwardSource};
//! use fleetline_core::types::{BatchItem, VehicleDescriptor};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let item = BatchItem::new(VehicleDescriptor::new("Activa", "STD", "Red"), 5);
//! let rows = plan_inward("H1", &InwardSource::External("HMSI (OEM)".into()), None, date, "", &[item]).unwrap();
//!
//! let mut ledger = Ledger::new();
//! ledger.append_all(rows);
//! assert_eq!(ledger.stock_for("H1", &VehicleDescriptor::new("activa", "std", "red"), None), 5);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod batch;
pub mod catalog;
pub mod error;
pub mod fulfillment;
pub mod hierarchy;
pub mod ledger;
pub mod money;
pub mod posting;
pub mod projection;
pub mod role;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use batch::{BatchKind, VehicleBatch};
pub use catalog::{VehicleCatalog, VehiclePrice};
pub use error::{CoreError, CoreResult, ValidationError};
pub use fulfillment::{
    ComplianceFlag, ComplianceFlags, ComplianceUpdate, FulfillmentStatus, NewSalesRecord,
    SalesRecord,
};
pub use hierarchy::BranchHierarchy;
pub use money::Money;
pub use posting::{InwardSource, StockPolicy};
pub use projection::{ColorMatrix, MatrixColumn, StockSnapshot};
pub use role::{AuthError, Identity, IdentityProvider, Role};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct line items in a single batch.
pub const MAX_BATCH_ITEMS: usize = 100;

/// Maximum quantity of one vehicle descriptor in a batch line.
///
/// Guards against typing 1000 instead of 10 on a manual entry form.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest counted stock, and largest single correction, a manual
/// adjustment may record.
pub const MAX_ADJUSTMENT_QUANTITY: i64 = 99_999;

/// Default cap on rows returned by an undated recent-activity query.
pub const DEFAULT_RECENT_LIMIT: u32 = 100;

/// Label used for manufacturer arrivals when no branch is the source.
pub const OEM_SOURCE_LABEL: &str = "HMSI (OEM)";

/// Column/row label for the summed cells of a color matrix.
pub const TOTAL_LABEL: &str = "TOTAL";
