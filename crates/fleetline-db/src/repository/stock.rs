//! # Stock Repository
//!
//! Net stock projection computed in SQL from the ledger.
//!
//! ## Signed Sum
//! ```text
//! SUM(CASE WHEN transaction_type IN ('INWARD_OEM','INWARD_TRANSFER') THEN  quantity
//!          WHEN transaction_type IN ('OUTWARD_TRANSFER','SALE')      THEN -quantity
//!          WHEN transaction_type IN ('ADJUSTMENT')                   THEN  quantity
//!          ELSE 0 END)
//! ```
//! The expression is generated from [`TransactionType::direction`] so it
//! cannot drift from the in-memory fold in fleetline-core.

use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use fleetline_core::ledger::Direction;
use fleetline_core::{StockLine, StockSnapshot, TransactionType, VehicleDescriptor};

use crate::error::DbResult;

/// Signed contribution expression for a row aliased as `alias`.
pub fn contribution_sql(alias: &str) -> String {
    let list = |direction: Direction| {
        TransactionType::ALL
            .iter()
            .filter(|t| t.direction() == direction)
            .map(|t| format!("'{}'", t.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "CASE WHEN {a}.transaction_type IN ({inbound}) THEN {a}.quantity \
         WHEN {a}.transaction_type IN ({outbound}) THEN -{a}.quantity \
         WHEN {a}.transaction_type IN ({signed}) THEN {a}.quantity \
         ELSE 0 END",
        a = alias,
        inbound = list(Direction::Inbound),
        outbound = list(Direction::Outbound),
        signed = list(Direction::Signed),
    )
}

/// Net stock of one descriptor at one branch, on an open connection.
pub async fn stock_on(
    conn: &mut SqliteConnection,
    branch_id: &str,
    descriptor: &VehicleDescriptor,
    as_of: Option<NaiveDate>,
) -> DbResult<i64> {
    let sql = format!(
        "SELECT COALESCE(SUM({}), 0) FROM inventory_transactions t \
         WHERE t.current_branch_id = ?1 AND t.model = ?2 AND t.variant = ?3 AND t.color = ?4 \
         AND (?5 IS NULL OR t.date <= ?5)",
        contribution_sql("t")
    );

    let stock: i64 = sqlx::query_scalar(&sql)
        .bind(branch_id)
        .bind(&descriptor.model)
        .bind(&descriptor.variant)
        .bind(&descriptor.color)
        .bind(as_of)
        .fetch_one(&mut *conn)
        .await?;

    Ok(stock)
}

/// Repository for stock projection queries.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Net stock of one (branch, model, variant, color). 0 when no rows.
    ///
    /// The descriptor is normalized before matching.
    pub async fn stock_for(
        &self,
        branch_id: &str,
        descriptor: &VehicleDescriptor,
        as_of: Option<NaiveDate>,
    ) -> DbResult<i64> {
        let descriptor =
            VehicleDescriptor::new(&descriptor.model, &descriptor.variant, &descriptor.color);
        let mut conn = self.pool.acquire().await?;
        stock_on(&mut conn, branch_id, &descriptor, as_of).await
    }

    /// Grouped net stock over a branch set.
    ///
    /// ## Returns
    /// Lines with non-zero quantity only, ordered by branch name, model,
    /// variant, color. Empty for an empty branch set.
    pub async fn multi_branch_stock(
        &self,
        branch_ids: &[String],
        as_of: Option<NaiveDate>,
    ) -> DbResult<Vec<StockLine>> {
        if branch_ids.is_empty() {
            return Ok(Vec::new());
        }

        let contribution = contribution_sql("t");
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT t.current_branch_id AS branch_id, b.branch_name AS branch_name, \
             t.model AS model, t.variant AS variant, t.color AS color, \
             SUM({contribution}) AS quantity \
             FROM inventory_transactions t \
             JOIN branches b ON b.branch_id = t.current_branch_id \
             WHERE t.current_branch_id IN ("
        ));
        let mut ids = qb.separated(", ");
        for id in branch_ids {
            ids.push_bind(id);
        }
        ids.push_unseparated(")");

        if let Some(as_of) = as_of {
            qb.push(" AND t.date <= ").push_bind(as_of);
        }

        qb.push(format!(
            " GROUP BY t.current_branch_id, b.branch_name, t.model, t.variant, t.color \
             HAVING SUM({contribution}) <> 0 \
             ORDER BY b.branch_name, t.current_branch_id, t.model, t.variant, t.color"
        ));

        let lines: Vec<StockLine> = qb.build_query_as().fetch_all(&self.pool).await?;

        debug!(branches = branch_ids.len(), lines = lines.len(), "Stock projection");
        Ok(lines)
    }

    /// [`multi_branch_stock`](Self::multi_branch_stock) wrapped for drill-down.
    pub async fn snapshot(
        &self,
        branch_ids: &[String],
        as_of: Option<NaiveDate>,
    ) -> DbResult<StockSnapshot> {
        Ok(StockSnapshot::new(
            self.multi_branch_stock(branch_ids, as_of).await?,
        ))
    }
}
