//! # Branch Repository
//!
//! Branch master data and the head / sub-branch edges.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use fleetline_core::{Branch, BranchHierarchy, HierarchyEdge};
use fleetline_core::validation::validate_branch_id;

use crate::error::DbResult;
use crate::pool::begin_write;

/// Loads every branch and edge and builds the resolver, on an open connection.
pub async fn hierarchy_on(conn: &mut SqliteConnection) -> DbResult<BranchHierarchy> {
    let branches: Vec<Branch> =
        sqlx::query_as("SELECT branch_id, branch_name FROM branches ORDER BY branch_id")
            .fetch_all(&mut *conn)
            .await?;

    let edges: Vec<HierarchyEdge> = sqlx::query_as(
        "SELECT sub_branch_id, parent_branch_id FROM branch_hierarchy ORDER BY sub_branch_id",
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(BranchHierarchy::new(branches, edges)?)
}

/// Repository for branch master data.
#[derive(Debug, Clone)]
pub struct BranchRepository {
    pool: SqlitePool,
}

impl BranchRepository {
    /// Creates a new BranchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BranchRepository { pool }
    }

    /// Every branch, sorted by id.
    pub async fn list_all(&self) -> DbResult<Vec<Branch>> {
        let branches =
            sqlx::query_as("SELECT branch_id, branch_name FROM branches ORDER BY branch_id")
                .fetch_all(&self.pool)
                .await?;
        Ok(branches)
    }

    pub async fn get(&self, branch_id: &str) -> DbResult<Option<Branch>> {
        let branch = sqlx::query_as("SELECT branch_id, branch_name FROM branches WHERE branch_id = ?1")
            .bind(branch_id.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(branch)
    }

    pub async fn exists(&self, branch_id: &str) -> DbResult<bool> {
        Ok(self.get(branch_id).await?.is_some())
    }

    /// Current resolver over all branches and edges.
    pub async fn hierarchy(&self) -> DbResult<BranchHierarchy> {
        let mut conn = self.pool.acquire().await?;
        hierarchy_on(&mut conn).await
    }

    /// Inserts a branch (master data).
    pub async fn insert(&self, branch: &Branch) -> DbResult<()> {
        validate_branch_id(&branch.branch_id)?;
        debug!(branch_id = %branch.branch_id, "Inserting branch");

        sqlx::query("INSERT INTO branches (branch_id, branch_name) VALUES (?1, ?2)")
            .bind(branch.branch_id.trim())
            .bind(branch.branch_name.trim())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Places a sub-branch under a head.
    ///
    /// ## Errors
    /// `InvalidHierarchy` when the edge would break the two-level shape.
    pub async fn add_edge(&self, edge: &HierarchyEdge) -> DbResult<()> {
        let mut tx = begin_write(&self.pool).await?;

        let hierarchy = hierarchy_on(&mut tx).await?;
        hierarchy.check_edge(edge)?;

        sqlx::query(
            "INSERT INTO branch_hierarchy (sub_branch_id, parent_branch_id) VALUES (?1, ?2)",
        )
        .bind(&edge.sub_branch_id)
        .bind(&edge.parent_branch_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(sub = %edge.sub_branch_id, parent = %edge.parent_branch_id, "Hierarchy edge added");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM branches")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
