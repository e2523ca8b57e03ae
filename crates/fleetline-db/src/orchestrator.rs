//! # Transfer Orchestrator
//!
//! The only business write path into the ledger. Each call turns one user
//! intent into ledger rows and commits them atomically.
//!
//! ## Write Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_transfer(S1 → S2, items)                                        │
//! │                                                                         │
//! │  BEGIN IMMEDIATE                                                        │
//! │    hierarchy_on(tx)            load branches + edges                    │
//! │    validate_destination        S2 ∈ territory(owning_head(S1))          │
//! │    plan_transfer               OUT@S1 + IN@S2 per item, shared uuid     │
//! │    [RejectNegative]            stock_on(tx) per touched tuple           │
//! │    insert_on(tx)               append rows                              │
//! │  COMMIT ─────────────────────► WriteReceipt { ids, movement ids }       │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction (rollback).              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All reads happen on the transaction's connection, so the projection the
//! stock check sees is the one the insert lands on.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use fleetline_core::posting::{
    check_stock, net_changes, plan_adjustment, plan_inward, plan_sale, plan_transfer,
};
use fleetline_core::{
    BatchItem, CoreError, InwardSource, NewTransaction, StockPolicy, VehicleDescriptor,
    WriteReceipt,
};

use crate::error::DbResult;
use crate::pool::begin_write;
use crate::repository::branch::hierarchy_on;
use crate::repository::ledger::insert_on;
use crate::repository::stock::stock_on;

/// Atomic writer for inward, transfer, sale and adjustment intents.
#[derive(Debug, Clone)]
pub struct TransferOrchestrator {
    pool: SqlitePool,
    policy: StockPolicy,
}

impl TransferOrchestrator {
    pub fn new(pool: SqlitePool, policy: StockPolicy) -> Self {
        TransferOrchestrator { pool, policy }
    }

    pub fn policy(&self) -> StockPolicy {
        self.policy
    }

    /// Receives stock at `dest`.
    ///
    /// ## Arguments
    /// * `source` - a branch id (internal movement, written as transfer pairs)
    ///   or any other label such as "HMSI (OEM)" (one INWARD_OEM row per item)
    /// * `load_number` - carried on the INWARD leg / row
    ///
    /// ## Errors
    /// `NotFound` for an unknown `dest`, `Validation` when `source == dest`
    /// or the batch is empty or out of range.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_inward(
        &self,
        dest: &str,
        source: &str,
        load_number: Option<&str>,
        date: NaiveDate,
        remarks: &str,
        items: &[BatchItem],
    ) -> DbResult<WriteReceipt> {
        let dest = dest.trim();
        let mut tx = begin_write(&self.pool).await?;

        let hierarchy = hierarchy_on(&mut tx).await?;
        if !hierarchy.contains(dest) {
            return Err(CoreError::not_found("Branch", dest).into());
        }
        let source = InwardSource::resolve(source, |id| hierarchy.contains(id));
        let rows = plan_inward(dest, &source, load_number, date, remarks, items)?;

        self.check_policy(&mut tx, &rows).await?;
        let ids = insert_on(&mut tx, &rows).await?;
        tx.commit().await?;

        let receipt = receipt(ids, &rows);
        info!(
            dest = %dest,
            source = ?source,
            rows = receipt.row_count(),
            "Inward recorded"
        );
        Ok(receipt)
    }

    /// Moves stock from `from` to `to` inside one territory.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown branch
    /// - `InvalidDestination` when `to` is `from` or outside its territory
    pub async fn record_transfer(
        &self,
        from: &str,
        to: &str,
        date: NaiveDate,
        remarks: &str,
        items: &[BatchItem],
    ) -> DbResult<WriteReceipt> {
        let (from, to) = (from.trim(), to.trim());
        let mut tx = begin_write(&self.pool).await?;

        let hierarchy = hierarchy_on(&mut tx).await?;
        if let Err(e) = hierarchy.validate_destination(from, to) {
            warn!(from = %from, to = %to, error = %e, "Transfer rejected");
            return Err(e.into());
        }
        let rows = plan_transfer(from, to, date, remarks, items)?;

        self.check_policy(&mut tx, &rows).await?;
        let ids = insert_on(&mut tx, &rows).await?;
        tx.commit().await?;

        let receipt = receipt(ids, &rows);
        info!(
            from = %from,
            to = %to,
            rows = receipt.row_count(),
            movements = receipt.movement_ids.len(),
            "Transfer recorded"
        );
        Ok(receipt)
    }

    /// One SALE row per item at `branch`.
    pub async fn record_sale(
        &self,
        branch: &str,
        date: NaiveDate,
        remarks: &str,
        items: &[BatchItem],
    ) -> DbResult<WriteReceipt> {
        let branch = branch.trim();
        let mut tx = begin_write(&self.pool).await?;

        let hierarchy = hierarchy_on(&mut tx).await?;
        if !hierarchy.contains(branch) {
            return Err(CoreError::not_found("Branch", branch).into());
        }
        let rows = plan_sale(branch, date, remarks, items)?;

        self.check_policy(&mut tx, &rows).await?;
        let ids = insert_on(&mut tx, &rows).await?;
        tx.commit().await?;

        let receipt = receipt(ids, &rows);
        info!(branch = %branch, rows = receipt.row_count(), "Sale recorded");
        Ok(receipt)
    }

    /// Signed correction of one stock tuple.
    ///
    /// ## Returns
    /// `None` when `delta` is zero (nothing written).
    #[allow(clippy::too_many_arguments)]
    pub async fn record_adjustment(
        &self,
        branch: &str,
        descriptor: &VehicleDescriptor,
        delta: i64,
        date: NaiveDate,
        reason: &str,
        actor: &str,
    ) -> DbResult<Option<WriteReceipt>> {
        let branch = branch.trim();
        let descriptor =
            VehicleDescriptor::new(&descriptor.model, &descriptor.variant, &descriptor.color);
        let mut tx = begin_write(&self.pool).await?;

        let hierarchy = hierarchy_on(&mut tx).await?;
        if !hierarchy.contains(branch) {
            return Err(CoreError::not_found("Branch", branch).into());
        }
        let Some(row) = plan_adjustment(branch, &descriptor, delta, date, reason, actor)? else {
            debug!(branch = %branch, descriptor = %descriptor, "Zero adjustment skipped");
            return Ok(None);
        };
        let rows = vec![row];

        self.check_policy(&mut tx, &rows).await?;
        let ids = insert_on(&mut tx, &rows).await?;
        tx.commit().await?;

        info!(
            branch = %branch,
            descriptor = %descriptor,
            delta,
            actor = %actor.trim(),
            "Adjustment recorded"
        );
        Ok(Some(receipt(ids, &rows)))
    }

    /// Under [`StockPolicy::RejectNegative`], checks every decreasing tuple
    /// against as-of-now stock on the open transaction.
    async fn check_policy(
        &self,
        conn: &mut SqliteConnection,
        rows: &[NewTransaction],
    ) -> DbResult<()> {
        if self.policy == StockPolicy::AllowNegative {
            return Ok(());
        }

        for ((branch_id, descriptor), change) in net_changes(rows) {
            if change >= 0 {
                continue;
            }
            let available = stock_on(&mut *conn, &branch_id, &descriptor, None).await?;
            if let Err(e) = check_stock(self.policy, &branch_id, &descriptor, available, change) {
                warn!(error = %e, "Write rejected by stock policy");
                return Err(e.into());
            }
        }
        Ok(())
    }
}

/// Collects ids and the distinct movement ids, keeping insert order.
fn receipt(transaction_ids: Vec<i64>, rows: &[NewTransaction]) -> WriteReceipt {
    let mut movement_ids: Vec<String> = Vec::new();
    for id in rows.iter().filter_map(|r| r.movement_id.as_ref()) {
        if !movement_ids.contains(id) {
            movement_ids.push(id.clone());
        }
    }
    WriteReceipt {
        transaction_ids,
        movement_ids,
    }
}
