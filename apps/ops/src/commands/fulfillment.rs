//! # Fulfillment Commands
//!
//! Customer sale records and their PDI / compliance workflow.
//!
//! ```text
//!  register_customer_sale        assign_pdi          complete_pdi
//!  (OpsDesk)                     (OpsDesk)           (MechanicDesk, own task)
//!        │                           │                      │
//!        ▼                           ▼                      ▼
//!  Pending PDI Assignment ──► PDI In Progress ──► PDI Complete
//!                                                           │ update_compliance
//!                                                           ▼ (ComplianceDesk)
//!                                          Insurance Done ──► TR Done
//! ```

use tracing::{debug, info, warn};

use fleetline_core::{ComplianceUpdate, FulfillmentStatus, NewSalesRecord, SalesRecord};

use crate::error::{ApiError, ApiResult};
use crate::state::{ComplianceDesk, DbState, MasterDataCache, MechanicDesk, OpsDesk};

fn missing(sale_id: i64) -> ApiError {
    ApiError::not_found("Sale record", &sale_id.to_string())
}

/// Creates a sale record in Pending PDI Assignment.
pub async fn register_customer_sale(
    db: &DbState,
    cache: &MasterDataCache,
    desk: &OpsDesk,
    input: &NewSalesRecord,
) -> ApiResult<SalesRecord> {
    debug!(
        actor = %desk.actor(),
        dc_number = %input.dc_number,
        "register_customer_sale command"
    );
    let record = db.inner().sales_records().create(input).await?;
    cache.invalidate();
    Ok(record)
}

/// Hands a pending sale to a mechanic.
///
/// ## Errors
/// - `NotFound` for an unknown sale
/// - `InvalidTransition` unless the sale is pending assignment
pub async fn assign_pdi(
    db: &DbState,
    cache: &MasterDataCache,
    desk: &OpsDesk,
    sale_id: i64,
    mechanic: &str,
) -> ApiResult<SalesRecord> {
    debug!(actor = %desk.actor(), sale_id, mechanic = %mechanic, "assign_pdi command");
    let record = db
        .inner()
        .sales_records()
        .assign_pdi(sale_id, mechanic)
        .await?
        .ok_or_else(|| missing(sale_id))?;
    cache.invalidate();
    Ok(record)
}

/// Closes the mechanic's own PDI task with the chassis number.
///
/// ## Errors
/// - `PermissionDenied` when the task is assigned to someone else
/// - `InvalidTransition` unless the task is in progress
pub async fn complete_pdi(
    db: &DbState,
    cache: &MasterDataCache,
    desk: &MechanicDesk,
    sale_id: i64,
    chassis_no: &str,
) -> ApiResult<SalesRecord> {
    debug!(actor = %desk.actor(), sale_id, "complete_pdi command");
    let repo = db.inner().sales_records();

    let current = repo.get(sale_id).await?.ok_or_else(|| missing(sale_id))?;
    if current.pdi_assigned_to.as_deref() != Some(desk.actor()) {
        warn!(
            actor = %desk.actor(),
            sale_id,
            assigned = ?current.pdi_assigned_to,
            "PDI completion refused"
        );
        return Err(ApiError::permission_denied(format!(
            "Sale {} is not assigned to {}",
            sale_id,
            desk.actor()
        )));
    }

    let record = repo
        .complete_pdi(sale_id, chassis_no)
        .await?
        .ok_or_else(|| missing(sale_id))?;
    cache.invalidate();
    info!(actor = %desk.actor(), sale_id, "PDI completed");
    Ok(record)
}

/// Sets compliance flags; status moves forward only.
pub async fn update_compliance(
    db: &DbState,
    cache: &MasterDataCache,
    desk: &ComplianceDesk,
    sale_id: i64,
    updates: &[ComplianceUpdate],
) -> ApiResult<SalesRecord> {
    debug!(
        actor = %desk.actor(),
        sale_id,
        updates = updates.len(),
        "update_compliance command"
    );
    let record = db
        .inner()
        .sales_records()
        .update_compliance(sale_id, updates)
        .await?
        .ok_or_else(|| missing(sale_id))?;
    cache.invalidate();
    Ok(record)
}

// =============================================================================
// Queues
// =============================================================================

/// Sales waiting for a mechanic, oldest first.
pub async fn pending_pdi_queue(
    db: &DbState,
    _desk: &OpsDesk,
    branch_id: Option<&str>,
) -> ApiResult<Vec<SalesRecord>> {
    Ok(db
        .inner()
        .sales_records()
        .records_by_status(FulfillmentStatus::PendingAssignment, branch_id)
        .await?)
}

/// Every PDI task currently being worked on.
pub async fn in_progress_pdi_queue(
    db: &DbState,
    _desk: &OpsDesk,
    branch_id: Option<&str>,
) -> ApiResult<Vec<SalesRecord>> {
    Ok(db
        .inner()
        .sales_records()
        .records_by_status(FulfillmentStatus::PdiInProgress, branch_id)
        .await?)
}

/// The signed-in mechanic's open tasks, scoped to their home branch.
pub async fn mechanic_queue(db: &DbState, desk: &MechanicDesk) -> ApiResult<Vec<SalesRecord>> {
    let branch = desk.identity().branch_id.as_deref();
    Ok(db
        .inner()
        .sales_records()
        .records_for_mechanic(desk.actor(), branch)
        .await?)
}

/// Records past PDI that still lack TR, oldest first.
pub async fn compliance_queue(
    db: &DbState,
    _desk: &ComplianceDesk,
    branch_id: Option<&str>,
) -> ApiResult<Vec<SalesRecord>> {
    let repo = db.inner().sales_records();
    let mut records = repo
        .records_by_status(FulfillmentStatus::PdiComplete, branch_id)
        .await?;
    records.extend(
        repo.records_by_status(FulfillmentStatus::InsuranceDone, branch_id)
            .await?,
    );
    records.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
    Ok(records)
}
