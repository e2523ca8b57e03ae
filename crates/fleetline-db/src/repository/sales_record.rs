//! # Sales Record Repository
//!
//! Customer sale records and the fulfillment workflow on top of them.
//!
//! ## Write Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    SELECT record            ── missing? → Ok(None), nothing written     │
//! │    record.assign_pdi(..)    ── pure transition in fleetline-core        │
//! │    UPDATE mutable columns                                               │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{info, warn};

use fleetline_core::{ComplianceUpdate, FulfillmentStatus, NewSalesRecord, SalesRecord};

use crate::error::{DbError, DbResult};
use crate::pool::begin_write;

const SELECT_COLUMNS: &str = "SELECT id, branch_id, dc_number, customer_name, sales_staff, \
     model, variant, paint_color, fulfillment_status, pdi_assigned_to, chassis_no, \
     pdi_completion_date, insurance_done, tr_done, dues_cleared, tax_paid, created_at \
     FROM sales_records";

async fn fetch_on(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<SalesRecord>> {
    let record = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(record)
}

/// Writes every workflow-owned column back.
async fn save_on(conn: &mut SqliteConnection, record: &SalesRecord) -> DbResult<()> {
    sqlx::query(
        "UPDATE sales_records SET \
            fulfillment_status = ?2, pdi_assigned_to = ?3, chassis_no = ?4, \
            pdi_completion_date = ?5, insurance_done = ?6, tr_done = ?7, \
            dues_cleared = ?8, tax_paid = ?9 \
         WHERE id = ?1",
    )
    .bind(record.id)
    .bind(record.fulfillment_status)
    .bind(&record.pdi_assigned_to)
    .bind(&record.chassis_no)
    .bind(record.pdi_completion_date)
    .bind(record.insurance_done)
    .bind(record.tr_done)
    .bind(record.dues_cleared)
    .bind(record.tax_paid)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Repository for sale records.
#[derive(Debug, Clone)]
pub struct SalesRecordRepository {
    pool: SqlitePool,
}

impl SalesRecordRepository {
    /// Creates a new SalesRecordRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SalesRecordRepository { pool }
    }

    /// Registers a customer sale in `Pending PDI Assignment`.
    pub async fn create(&self, input: &NewSalesRecord) -> DbResult<SalesRecord> {
        let input = input.validated()?;
        let now = Utc::now();

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO sales_records (\
                branch_id, dc_number, customer_name, sales_staff, model, variant, paint_color, \
                fulfillment_status, created_at\
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) RETURNING id",
        )
        .bind(&input.branch_id)
        .bind(&input.dc_number)
        .bind(&input.customer_name)
        .bind(&input.sales_staff)
        .bind(&input.model)
        .bind(&input.variant)
        .bind(&input.paint_color)
        .bind(FulfillmentStatus::PendingAssignment)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        info!(id, dc_number = %input.dc_number, branch = %input.branch_id, "Sale record created");

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("SalesRecord", id.to_string()))
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<SalesRecord>> {
        let mut conn = self.pool.acquire().await?;
        fetch_on(&mut conn, id).await
    }

    /// Assigns a mechanic and starts PDI.
    ///
    /// ## Returns
    /// `Ok(None)` when no record has this id (nothing is written).
    pub async fn assign_pdi(&self, id: i64, mechanic: &str) -> DbResult<Option<SalesRecord>> {
        self.transition(id, |record| Ok(record.assign_pdi(mechanic)?))
            .await
    }

    /// Completes PDI with the vehicle's chassis number.
    ///
    /// ## Returns
    /// `Ok(None)` when no record has this id.
    pub async fn complete_pdi(&self, id: i64, chassis_no: &str) -> DbResult<Option<SalesRecord>> {
        self.transition(id, |record| Ok(record.complete_pdi(chassis_no, Utc::now())?))
            .await
    }

    /// Applies compliance flag updates and re-derives the status.
    pub async fn update_compliance(
        &self,
        id: i64,
        updates: &[ComplianceUpdate],
    ) -> DbResult<Option<SalesRecord>> {
        self.transition(id, |record| {
            record.apply_compliance(updates);
            Ok(())
        })
        .await
    }

    async fn transition(
        &self,
        id: i64,
        apply: impl FnOnce(&mut SalesRecord) -> DbResult<()>,
    ) -> DbResult<Option<SalesRecord>> {
        let mut tx = begin_write(&self.pool).await?;

        let Some(mut record) = fetch_on(&mut tx, id).await? else {
            warn!(id, "Sale record not found; nothing updated");
            return Ok(None);
        };
        let before = record.fulfillment_status;

        apply(&mut record)?;
        save_on(&mut tx, &record).await?;
        tx.commit().await?;

        info!(
            id,
            from = %before,
            to = %record.fulfillment_status,
            "Sale record updated"
        );
        Ok(Some(record))
    }

    /// Records in one status, optionally limited to a branch, oldest first.
    pub async fn records_by_status(
        &self,
        status: FulfillmentStatus,
        branch_id: Option<&str>,
    ) -> DbResult<Vec<SalesRecord>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_COLUMNS);
        qb.push(" WHERE fulfillment_status = ").push_bind(status);
        if let Some(branch_id) = branch_id {
            qb.push(" AND branch_id = ").push_bind(branch_id);
        }
        qb.push(" ORDER BY created_at, id");

        let rows = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// In-progress PDI tasks assigned to one mechanic.
    pub async fn records_for_mechanic(
        &self,
        mechanic: &str,
        branch_id: Option<&str>,
    ) -> DbResult<Vec<SalesRecord>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_COLUMNS);
        qb.push(" WHERE fulfillment_status = ")
            .push_bind(FulfillmentStatus::PdiInProgress);
        qb.push(" AND pdi_assigned_to = ").push_bind(mechanic.trim());
        if let Some(branch_id) = branch_id {
            qb.push(" AND branch_id = ").push_bind(branch_id);
        }
        qb.push(" ORDER BY created_at, id");

        let rows = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows)
    }
}
