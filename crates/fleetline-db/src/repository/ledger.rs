//! # Ledger Repository
//!
//! Append primitive and read queries over `inventory_transactions`.
//!
//! ## Visibility Rule
//! ```text
//! A branch "sees" a row when it is any endpoint:
//!
//!   current_branch_id ∈ set  OR  from_branch_id ∈ set  OR  to_branch_id ∈ set
//!
//! Ordered by date DESC, id DESC. Without a date range the newest N rows
//! are returned (order first, then limit).
//! ```
//!
//! There is no update or delete here. The schema triggers reject both.

use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use fleetline_core::{DateRange, InventoryTransaction, NewTransaction, TransferSummary};

use crate::error::DbResult;
use crate::pool::begin_write;

const SELECT_COLUMNS: &str = "SELECT id, recorded_at, date, transaction_type, source_external, \
     from_branch_id, current_branch_id, to_branch_id, movement_id, \
     model, variant, color, quantity, load_number, remarks \
     FROM inventory_transactions";

/// Appends rows on an open connection, returning their ids in order.
pub async fn insert_on(conn: &mut SqliteConnection, rows: &[NewTransaction]) -> DbResult<Vec<i64>> {
    let recorded_at = Utc::now();
    let mut ids = Vec::with_capacity(rows.len());

    for row in rows {
        let result = sqlx::query(
            "INSERT INTO inventory_transactions (\
                recorded_at, date, transaction_type, source_external, \
                from_branch_id, current_branch_id, to_branch_id, movement_id, \
                model, variant, color, quantity, load_number, remarks\
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        )
        .bind(recorded_at)
        .bind(row.date)
        .bind(row.transaction_type)
        .bind(&row.source_external)
        .bind(&row.from_branch_id)
        .bind(&row.current_branch_id)
        .bind(&row.to_branch_id)
        .bind(&row.movement_id)
        .bind(&row.descriptor.model)
        .bind(&row.descriptor.variant)
        .bind(&row.descriptor.color)
        .bind(row.quantity)
        .bind(&row.load_number)
        .bind(&row.remarks)
        .execute(&mut *conn)
        .await?;

        ids.push(result.last_insert_rowid());
    }

    Ok(ids)
}

/// Repository for ledger reads.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Appends rows in one SQL transaction (all or nothing).
    ///
    /// Business writes go through the orchestrator; this is the raw primitive.
    pub async fn append(&self, rows: &[NewTransaction]) -> DbResult<Vec<i64>> {
        let mut tx = begin_write(&self.pool).await?;
        let ids = insert_on(&mut tx, rows).await?;
        tx.commit().await?;
        Ok(ids)
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<InventoryTransaction>> {
        let row = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Rows touching any branch in the set, newest first.
    ///
    /// ## Arguments
    /// * `range` - inclusive business-date filter; when absent, `limit` applies
    /// * `limit` - cap for the undated query
    pub async fn transactions_for_branches(
        &self,
        branch_ids: &[String],
        range: Option<DateRange>,
        limit: u32,
    ) -> DbResult<Vec<InventoryTransaction>> {
        if branch_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_COLUMNS);
        qb.push(" WHERE (");
        for (i, column) in ["current_branch_id", "from_branch_id", "to_branch_id"]
            .iter()
            .enumerate()
        {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(column).push(" IN (");
            let mut ids = qb.separated(", ");
            for id in branch_ids {
                ids.push_bind(id);
            }
            ids.push_unseparated(")");
        }
        qb.push(")");

        if let Some(range) = range {
            qb.push(" AND date >= ").push_bind(range.start);
            qb.push(" AND date <= ").push_bind(range.end);
        }

        qb.push(" ORDER BY date DESC, id DESC");

        if range.is_none() {
            qb.push(" LIMIT ").push_bind(i64::from(limit));
        }

        let rows: Vec<InventoryTransaction> = qb.build_query_as().fetch_all(&self.pool).await?;
        debug!(branches = branch_ids.len(), rows = rows.len(), "Recent transactions");
        Ok(rows)
    }

    /// Both legs of one transfer pair, in insert order.
    pub async fn movement_legs(&self, movement_id: &str) -> DbResult<Vec<InventoryTransaction>> {
        let rows = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE movement_id = ?1 ORDER BY id"
        ))
        .bind(movement_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Movement ids whose legs are not exactly one OUTWARD_TRANSFER and one
    /// INWARD_TRANSFER with matching descriptor, quantity and date.
    pub async fn unbalanced_movements(&self) -> DbResult<Vec<String>> {
        let ids = sqlx::query_scalar(
            "SELECT movement_id FROM inventory_transactions \
             WHERE movement_id IS NOT NULL \
             GROUP BY movement_id \
             HAVING COUNT(*) <> 2 \
                OR SUM(transaction_type = 'OUTWARD_TRANSFER') <> 1 \
                OR SUM(transaction_type = 'INWARD_TRANSFER') <> 1 \
                OR COUNT(DISTINCT model || '/' || variant || '/' || color || '/' || quantity || '/' || date) <> 1 \
             ORDER BY movement_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// Outward legs grouped by date, sender and receiver, newest date first.
    pub async fn daily_transfer_summary(
        &self,
        since: Option<NaiveDate>,
    ) -> DbResult<Vec<TransferSummary>> {
        let rows = sqlx::query_as(
            "SELECT t.date AS date, f.branch_name AS from_branch, d.branch_name AS to_branch, \
                    SUM(t.quantity) AS total_qty \
             FROM inventory_transactions t \
             JOIN branches f ON f.branch_id = t.current_branch_id \
             JOIN branches d ON d.branch_id = t.to_branch_id \
             WHERE t.transaction_type = 'OUTWARD_TRANSFER' \
               AND (?1 IS NULL OR t.date >= ?1) \
             GROUP BY t.date, t.current_branch_id, t.to_branch_id, f.branch_name, d.branch_name \
             ORDER BY t.date DESC, f.branch_name, d.branch_name",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, DbError};
    use fleetline_core::{Branch, TransactionType, VehicleDescriptor};

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for id in ["H1", "S1"] {
            db.branches().insert(&Branch::new(id, id)).await.unwrap();
        }
        db
    }

    fn oem(branch: &str, qty: i64) -> NewTransaction {
        NewTransaction {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            transaction_type: TransactionType::InwardOem,
            source_external: Some("HMSI (OEM)".into()),
            from_branch_id: None,
            current_branch_id: branch.into(),
            to_branch_id: None,
            movement_id: None,
            descriptor: VehicleDescriptor::new("Activa", "STD", "Red"),
            quantity: qty,
            load_number: None,
            remarks: String::new(),
        }
    }

    #[tokio::test]
    async fn test_append_round_trip() {
        let db = setup().await;
        let ids = db.ledger().append(&[oem("H1", 5)]).await.unwrap();
        assert_eq!(ids.len(), 1);

        let row = db.ledger().get(ids[0]).await.unwrap().unwrap();
        assert_eq!(row.transaction_type, TransactionType::InwardOem);
        assert_eq!(row.model, "ACTIVA");
        assert_eq!(row.quantity, 5);
    }

    #[tokio::test]
    async fn test_append_is_all_or_nothing() {
        let db = setup().await;
        let err = db
            .ledger()
            .append(&[oem("H1", 1), oem("NOPE", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UnknownReference(_)));
        assert_eq!(db.ledger().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rows_cannot_be_updated_or_deleted() {
        let db = setup().await;
        db.ledger().append(&[oem("H1", 5)]).await.unwrap();

        let update = sqlx::query("UPDATE inventory_transactions SET quantity = 50")
            .execute(db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(update, DbError::LedgerImmutable));

        let delete = sqlx::query("DELETE FROM inventory_transactions")
            .execute(db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(delete, DbError::LedgerImmutable));
        assert_eq!(db.ledger().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_non_positive_quantity_rejected() {
        let db = setup().await;
        let err = db.ledger().append(&[oem("H1", 0)]).await.unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation(_)));
    }
}
