//! # Stock Commands
//!
//! Public stock views. None of these need a signed-in session.
//!
//! ## Drill-Down
//! ```text
//! territory_stock(H1) ─► TerritoryStock { total: 5, snapshot }
//!                              │
//!                              ▼
//!        snapshot.model_totals()          ACTIVA 5 │ SHINE 0
//!                              │
//!                              ▼
//!        snapshot.variant_totals("ACTIVA") STD 5
//!                              │
//!                              ▼
//!        snapshot.color_matrix("ACTIVA", "STD")
//!              ┌───────┬──────────────┬─────────────┬───────┐
//!              │ color │ Main Showroom│ Town Outlet │ TOTAL │
//!              ├───────┼──────────────┼─────────────┼───────┤
//!              │ RED   │      3       │      2      │   5   │
//!              │ TOTAL │      3       │      2      │   5   │
//!              └───────┴──────────────┴─────────────┴───────┘
//! ```
//! The drill-down helpers work on the one fetched snapshot; no further
//! queries are issued.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use fleetline_core::validation::validate_date_range;
use fleetline_core::{
    Branch, InventoryTransaction, StockSnapshot, TransferSummary, VehicleDescriptor,
};

use crate::error::{ApiError, ApiResult};
use crate::state::{DbState, MasterDataCache};

/// Stock of one head's territory (or a selected part of it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerritoryStock {
    pub head: Branch,
    /// Branches the snapshot covers.
    pub branches: Vec<Branch>,
    /// Headline number.
    pub total: i64,
    pub snapshot: StockSnapshot,
}

/// Net stock over a branch set, optionally as of a past date.
pub async fn stock_snapshot(
    db: &DbState,
    branch_ids: &[String],
    as_of: Option<NaiveDate>,
) -> ApiResult<StockSnapshot> {
    debug!(branches = ?branch_ids, as_of = ?as_of, "stock_snapshot command");
    Ok(db.inner().stock().snapshot(branch_ids, as_of).await?)
}

/// Stock of the branches managed by `head`.
///
/// ## Arguments
/// * `selected` - subset of the territory to show; the whole territory
///   when absent or empty
///
/// ## Errors
/// - `NotFound` for an unknown head
/// - `InvalidInput` when a selected branch lies outside the territory
pub async fn territory_stock(
    db: &DbState,
    cache: &MasterDataCache,
    head: &str,
    selected: Option<&[String]>,
    as_of: Option<NaiveDate>,
) -> ApiResult<TerritoryStock> {
    let head = head.trim();
    let hierarchy = cache.hierarchy(db.inner()).await?;
    let managed = hierarchy.managed_branches(head)?;
    let head_branch = managed
        .first()
        .cloned()
        .ok_or_else(|| ApiError::not_found("Branch", head))?;

    let branches: Vec<Branch> = match selected {
        Some(ids) if !ids.is_empty() => {
            if let Some(outside) = ids
                .iter()
                .find(|id| !managed.iter().any(|b| &b.branch_id == *id))
            {
                return Err(ApiError::invalid_input(format!(
                    "Branch {} is not managed by {}",
                    outside, head
                )));
            }
            managed
                .iter()
                .filter(|b| ids.contains(&b.branch_id))
                .cloned()
                .collect()
        }
        _ => managed.clone(),
    };

    let ids: Vec<String> = branches.iter().map(|b| b.branch_id.clone()).collect();
    let snapshot = db.inner().stock().snapshot(&ids, as_of).await?;
    debug!(
        head = %head,
        branches = ids.len(),
        lines = snapshot.lines.len(),
        "territory_stock command"
    );

    Ok(TerritoryStock {
        head: head_branch,
        branches,
        total: snapshot.total(),
        snapshot,
    })
}

/// On-hand quantity of one descriptor at one branch.
///
/// ## Errors
/// `NotFound` for an unknown branch.
pub async fn single_item_stock(
    db: &DbState,
    cache: &MasterDataCache,
    branch: &str,
    model: &str,
    variant: &str,
    color: &str,
) -> ApiResult<i64> {
    let branch = branch.trim();
    let hierarchy = cache.hierarchy(db.inner()).await?;
    if !hierarchy.contains(branch) {
        return Err(ApiError::not_found("Branch", branch));
    }

    let descriptor = VehicleDescriptor::new(model, variant, color);
    let quantity = db.inner().stock().stock_for(branch, &descriptor, None).await?;
    debug!(branch = %branch, descriptor = %descriptor, quantity, "single_item_stock command");
    Ok(quantity)
}

/// Ledger rows touching the branch set, newest first.
///
/// Both dates or neither. Without dates the configured row cap applies.
pub async fn recent_transactions(
    db: &DbState,
    branch_ids: &[String],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> ApiResult<Vec<InventoryTransaction>> {
    let range = validate_date_range(start, end)?;
    debug!(branches = ?branch_ids, range = ?range, "recent_transactions command");
    Ok(db
        .inner()
        .ledger()
        .transactions_for_branches(branch_ids, range, db.recent_limit())
        .await?)
}

/// Outward quantities grouped by day, sender and receiver.
pub async fn daily_transfer_summary(
    db: &DbState,
    since: Option<NaiveDate>,
) -> ApiResult<Vec<TransferSummary>> {
    debug!(since = ?since, "daily_transfer_summary command");
    Ok(db.inner().ledger().daily_transfer_summary(since).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::fixture;
    use crate::error::ErrorCode;
    use fleetline_core::{BatchItem, Role, OEM_SOURCE_LABEL};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn activa(qty: i64) -> Vec<BatchItem> {
        vec![BatchItem::new(VehicleDescriptor::new("Activa", "STD", "Red"), qty)]
    }

    async fn stocked() -> (DbState, MasterDataCache) {
        let (db, cache, _) = fixture(Role::Owner).await;
        let writer = db.orchestrator();
        writer
            .record_inward("H1", OEM_SOURCE_LABEL, Some("L-1"), date(1), "", &activa(5))
            .await
            .unwrap();
        writer
            .record_transfer("H1", "S1", date(2), "", &activa(2))
            .await
            .unwrap();
        (db, cache)
    }

    #[tokio::test]
    async fn test_territory_stock_drill_down() {
        let (db, cache) = stocked().await;

        let territory = territory_stock(&db, &cache, "H1", None, None).await.unwrap();
        assert_eq!(territory.head.branch_id, "H1");
        assert_eq!(territory.branches.len(), 3);
        assert_eq!(territory.total, 5);

        let matrix = territory.snapshot.color_matrix("ACTIVA", "STD");
        assert_eq!(matrix.cell("RED", "H1"), 3);
        assert_eq!(matrix.cell("RED", "S1"), 2);
        assert_eq!(matrix.columns[0].label, "Main Showroom");
        assert_eq!(matrix.grand_total(), 5);
    }

    #[tokio::test]
    async fn test_territory_selection() {
        let (db, cache) = stocked().await;

        let only_s1 = vec!["S1".to_string()];
        let territory = territory_stock(&db, &cache, "H1", Some(&only_s1), None)
            .await
            .unwrap();
        assert_eq!(territory.total, 2);

        let outside = vec!["S3".to_string()];
        let err = territory_stock(&db, &cache, "H1", Some(&outside), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_as_of_before_transfer() {
        let (db, cache) = stocked().await;
        let territory = territory_stock(&db, &cache, "H1", None, Some(date(1)))
            .await
            .unwrap();
        assert_eq!(territory.snapshot.lines.len(), 1);
        assert_eq!(territory.snapshot.lines[0].branch_id, "H1");
        assert_eq!(territory.snapshot.lines[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_single_item_stock() {
        let (db, cache) = stocked().await;
        let qty = single_item_stock(&db, &cache, "S1", "activa", " std ", "red")
            .await
            .unwrap();
        assert_eq!(qty, 2);

        let err = single_item_stock(&db, &cache, "ZZ", "Activa", "STD", "Red")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_recent_transactions_range_rules() {
        let (db, _) = stocked().await;
        let ids = vec!["S1".to_string()];

        let rows = recent_transactions(&db, &ids, None, None).await.unwrap();
        assert_eq!(rows.len(), 2);

        let rows = recent_transactions(&db, &ids, Some(date(1)), Some(date(1)))
            .await
            .unwrap();
        assert!(rows.is_empty());

        let err = recent_transactions(&db, &ids, Some(date(2)), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_daily_transfer_summary() {
        let (db, _) = stocked().await;
        let summary = daily_transfer_summary(&db, None).await.unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].from_branch, "Main Showroom");
        assert_eq!(summary[0].to_branch, "Town Outlet");
        assert_eq!(summary[0].total_qty, 2);
    }
}
