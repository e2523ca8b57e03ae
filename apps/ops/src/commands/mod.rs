//! # Commands Module
//!
//! Query and command functions of the ops surface.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs          ◄─── You are here (exports)
//! ├── auth.rs         ◄─── Sign in / out
//! ├── branch.rs       ◄─── Branch lists, inward source options
//! ├── catalog.rs      ◄─── Vehicle catalog and prices
//! ├── stock.rs        ◄─── Snapshots, drill-down, recent transactions
//! ├── batch.rs        ◄─── Session batch accumulation
//! ├── movement.rs     ◄─── Inward / transfer / sales submits, adjustments
//! └── fulfillment.rs  ◄─── Customer sales, PDI and compliance
//! ```
//!
//! ## State Injection
//! Each function takes only the state it needs, plus a desk token when the
//! operation is role-gated:
//! ```rust,ignore
//! // Public view: no desk
//! stock_snapshot(&db, &ids, None).await?;
//!
//! // Ops desk required
//! let desk = session.ops_desk()?;
//! submit_transfer(&db, &cache, &session, &desk, "H1", "S1", date, "").await?;
//! ```
//!
//! Every successful write invalidates the master-data cache before
//! returning.

pub mod auth;
pub mod batch;
pub mod branch;
pub mod catalog;
pub mod fulfillment;
pub mod movement;
pub mod stock;
