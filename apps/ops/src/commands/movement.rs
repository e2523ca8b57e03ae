//! # Movement Commands
//!
//! Submit the session batches to the ledger, and correct single tuples.
//!
//! ## Submit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  submit_transfer(H1 → S1)                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  session.batch(Transfer)  (copy, batch still held)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  TransferOrchestrator::record_transfer   one SQLite transaction         │
//! │       │                                                                 │
//! │       ├── Err ─► batch untouched, ApiError to caller                    │
//! │       │                                                                 │
//! │       ▼ Ok(receipt)                                                     │
//! │  settle_batch(Transfer, submitted lines) + cache.invalidate()           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use fleetline_core::posting::adjustment_delta;
use fleetline_core::validation::validate_stock_count;
use fleetline_core::{BatchKind, VehicleBatch, VehicleDescriptor, WriteReceipt};

use crate::error::ApiResult;
use crate::state::{DbState, MasterDataCache, OpsDesk, SessionState};

/// Header of an inward delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InwardRequest {
    pub dest: String,
    /// Branch id for an internal movement, any other label for external.
    pub source: String,
    pub load_number: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub remarks: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub remarks: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesRequest {
    pub branch: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub remarks: String,
}

/// Sets one tuple's stock to a counted quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentRequest {
    pub branch: String,
    pub model: String,
    pub variant: String,
    pub color: String,
    /// Quantity the tuple should show after the adjustment.
    pub new_quantity: i64,
    pub date: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentOutcome {
    pub previous: i64,
    pub current: i64,
    /// Absent when the counted quantity already matched.
    pub receipt: Option<WriteReceipt>,
}

fn settle(
    session: &SessionState,
    cache: &MasterDataCache,
    kind: BatchKind,
    submitted: &VehicleBatch,
) {
    session.settle_batch(kind, submitted.items());
    cache.invalidate();
}

/// Writes the inward batch into `request.dest`.
///
/// ## Errors
/// - `NotFound` for an unknown destination
/// - `InvalidInput` for an empty batch or `source == dest`
pub async fn submit_inward(
    db: &DbState,
    cache: &MasterDataCache,
    session: &SessionState,
    desk: &OpsDesk,
    request: &InwardRequest,
) -> ApiResult<WriteReceipt> {
    let batch = session.batch(BatchKind::Inward);
    debug!(
        actor = %desk.actor(),
        dest = %request.dest,
        source = %request.source,
        lines = batch.len(),
        "submit_inward command"
    );

    let receipt = db
        .orchestrator()
        .record_inward(
            &request.dest,
            &request.source,
            request.load_number.as_deref(),
            request.date,
            &request.remarks,
            batch.items(),
        )
        .await?;

    settle(session, cache, BatchKind::Inward, &batch);
    info!(actor = %desk.actor(), rows = receipt.row_count(), "Inward batch submitted");
    Ok(receipt)
}

/// Writes the transfer batch as OUT/IN pairs.
///
/// ## Errors
/// `InvalidDestination` when `to` is outside the sender's territory.
pub async fn submit_transfer(
    db: &DbState,
    cache: &MasterDataCache,
    session: &SessionState,
    desk: &OpsDesk,
    request: &TransferRequest,
) -> ApiResult<WriteReceipt> {
    let batch = session.batch(BatchKind::Transfer);
    debug!(
        actor = %desk.actor(),
        from = %request.from,
        to = %request.to,
        lines = batch.len(),
        "submit_transfer command"
    );

    let receipt = db
        .orchestrator()
        .record_transfer(
            &request.from,
            &request.to,
            request.date,
            &request.remarks,
            batch.items(),
        )
        .await?;

    settle(session, cache, BatchKind::Transfer, &batch);
    info!(actor = %desk.actor(), rows = receipt.row_count(), "Transfer batch submitted");
    Ok(receipt)
}

pub async fn submit_sales(
    db: &DbState,
    cache: &MasterDataCache,
    session: &SessionState,
    desk: &OpsDesk,
    request: &SalesRequest,
) -> ApiResult<WriteReceipt> {
    let batch = session.batch(BatchKind::Sales);
    debug!(
        actor = %desk.actor(),
        branch = %request.branch,
        lines = batch.len(),
        "submit_sales command"
    );

    let receipt = db
        .orchestrator()
        .record_sale(&request.branch, request.date, &request.remarks, batch.items())
        .await?;

    settle(session, cache, BatchKind::Sales, &batch);
    info!(actor = %desk.actor(), rows = receipt.row_count(), "Sales batch submitted");
    Ok(receipt)
}

/// Records the difference between the counted and the on-hand quantity.
///
/// The signed-in user is recorded as the actor.
///
/// ## Errors
/// - `InvalidInput` for a count outside 0..=99999, a correction of more
///   than 99999 units or an empty reason
/// - `NotFound` for an unknown branch
pub async fn adjust_stock(
    db: &DbState,
    cache: &MasterDataCache,
    desk: &OpsDesk,
    request: &AdjustmentRequest,
) -> ApiResult<AdjustmentOutcome> {
    validate_stock_count(request.new_quantity)?;

    let descriptor = VehicleDescriptor::new(&request.model, &request.variant, &request.color);
    let previous = db
        .inner()
        .stock()
        .stock_for(request.branch.trim(), &descriptor, None)
        .await?;
    let delta = adjustment_delta(request.new_quantity, previous)?;
    debug!(
        actor = %desk.actor(),
        branch = %request.branch,
        descriptor = %descriptor,
        previous,
        delta,
        "adjust_stock command"
    );

    let receipt = db
        .orchestrator()
        .record_adjustment(
            &request.branch,
            &descriptor,
            delta,
            request.date,
            &request.reason,
            desk.actor(),
        )
        .await?;

    let current = if receipt.is_some() {
        cache.invalidate();
        request.new_quantity
    } else {
        previous
    };

    Ok(AdjustmentOutcome {
        previous,
        current,
        receipt,
    })
}
