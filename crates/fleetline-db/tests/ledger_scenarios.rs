//! End-to-end ledger scenarios against an in-memory database.
//!
//! One network for every test:
//!
//! ```text
//! H1 ──┬── S1
//!      └── S2
//! H2 ───── S3
//! ```

use chrono::NaiveDate;
use fleetline_core::{
    BatchItem, Branch, CoreError, DateRange, FulfillmentStatus, HierarchyEdge, NewSalesRecord,
    StockPolicy, TransactionType, VehicleDescriptor,
};
use fleetline_db::{Database, DbConfig, DbError, TransferOrchestrator};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

fn activa_red() -> VehicleDescriptor {
    VehicleDescriptor::new("Activa", "STD", "Red")
}

fn items(qty: i64) -> Vec<BatchItem> {
    vec![BatchItem::new(activa_red(), qty)]
}

fn ids(branches: &[&str]) -> Vec<String> {
    branches.iter().map(|b| b.to_string()).collect()
}

async fn network() -> Database {
    network_on(DbConfig::in_memory()).await
}

async fn network_on(config: DbConfig) -> Database {
    let db = Database::new(config).await.unwrap();
    for (id, name) in [
        ("H1", "Main Showroom"),
        ("H2", "City Showroom"),
        ("S1", "Town Outlet"),
        ("S2", "Highway Outlet"),
        ("S3", "Market Outlet"),
    ] {
        db.branches().insert(&Branch::new(id, name)).await.unwrap();
    }
    for (sub, parent) in [("S1", "H1"), ("S2", "H1"), ("S3", "H2")] {
        db.branches()
            .add_edge(&HierarchyEdge::new(sub, parent))
            .await
            .unwrap();
    }
    db
}

async fn stock(db: &Database, branch: &str) -> i64 {
    db.stock().stock_for(branch, &activa_red(), None).await.unwrap()
}

fn writer(db: &Database) -> TransferOrchestrator {
    db.orchestrator(StockPolicy::AllowNegative)
}

#[tokio::test]
async fn test_walkthrough_inward_transfer_sale_adjust() {
    let db = network().await;
    let orch = writer(&db);

    // OEM delivery of 5 at H1
    orch.record_inward("H1", "HMSI (OEM)", Some("LD-1"), day(1), "", &items(5))
        .await
        .unwrap();
    assert_eq!(stock(&db, "H1").await, 5);

    // 2 to S1
    orch.record_transfer("H1", "S1", day(2), "", &items(2))
        .await
        .unwrap();
    assert_eq!(stock(&db, "H1").await, 3);
    assert_eq!(stock(&db, "S1").await, 2);
    let snapshot = db.stock().snapshot(&ids(&["H1", "S1"]), None).await.unwrap();
    assert_eq!(snapshot.total(), 5);

    // Sell both at S1; the tuple drops out of the projection
    orch.record_sale("S1", day(3), "", &items(2)).await.unwrap();
    assert_eq!(stock(&db, "S1").await, 0);
    assert!(db
        .stock()
        .multi_branch_stock(&ids(&["S1"]), None)
        .await
        .unwrap()
        .is_empty());

    // One damaged unit written off at H1
    let receipt = orch
        .record_adjustment("H1", &activa_red(), -1, day(4), "damaged unit", "owner1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock(&db, "H1").await, 2);

    let row = db
        .ledger()
        .get(receipt.transaction_ids[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.transaction_type, TransactionType::Adjustment);
    assert_eq!(row.quantity, -1);
    assert_eq!(row.remarks, "ADJUSTMENT by owner1: damaged unit");
}

#[tokio::test]
async fn test_transfer_writes_matched_pair() {
    let db = network().await;
    let receipt = writer(&db)
        .record_transfer("S1", "S2", day(1), "rebalance", &items(3))
        .await
        .unwrap();
    assert_eq!(receipt.row_count(), 2);

    let legs = db
        .ledger()
        .movement_legs(&receipt.movement_ids[0])
        .await
        .unwrap();
    let (out, inn) = (&legs[0], &legs[1]);

    assert_eq!(out.transaction_type, TransactionType::OutwardTransfer);
    assert_eq!(out.current_branch_id, "S1");
    assert_eq!(out.to_branch_id.as_deref(), Some("S2"));
    assert_eq!(out.remarks, "Transfer OUT. rebalance");

    assert_eq!(inn.transaction_type, TransactionType::InwardTransfer);
    assert_eq!(inn.current_branch_id, "S2");
    assert_eq!(inn.from_branch_id.as_deref(), Some("S1"));
    assert_eq!(inn.remarks, "Transfer IN. rebalance");

    assert_eq!(out.descriptor(), inn.descriptor());
    assert_eq!(out.quantity, inn.quantity);
    assert_eq!(out.date, inn.date);

    assert!(db.ledger().unbalanced_movements().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_transfer_destination_rules() {
    let db = network().await;
    let orch = writer(&db);

    // Head to its own sub, sub to sibling, sub back to head
    for (from, to) in [("H1", "S2"), ("S1", "S2"), ("S2", "H1")] {
        orch.record_transfer(from, to, day(1), "", &items(1))
            .await
            .unwrap();
    }

    for (from, to) in [("S1", "S1"), ("S1", "S3"), ("H1", "H2")] {
        let err = orch
            .record_transfer(from, to, day(1), "", &items(1))
            .await
            .unwrap_err();
        assert!(
            matches!(err, DbError::Core(CoreError::InvalidDestination { .. })),
            "{from} → {to}: {err}"
        );
    }

    let err = orch
        .record_transfer("S1", "NOPE", day(1), "", &items(1))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Core(CoreError::NotFound { .. })));

    assert_eq!(db.ledger().count().await.unwrap(), 6);
}

#[tokio::test]
async fn test_failed_batch_leaves_ledger_untouched() {
    let db = network().await;
    let mut batch = items(2);
    batch.push(BatchItem::new(VehicleDescriptor::new("Shine", "DRUM", "Blue"), 1000));

    let err = writer(&db)
        .record_inward("H1", "HMSI (OEM)", None, day(1), "", &batch)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    assert_eq!(db.ledger().count().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_all_commit() {
    let path = std::env::temp_dir().join(format!("fleetline-writers-{}.db", std::process::id()));
    let remove_files = |path: &std::path::Path| {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    };
    remove_files(&path);
    let db = network_on(DbConfig::new(&path).max_connections(8)).await;

    let handles: Vec<_> = (0..16)
        .map(|n| {
            let orch = writer(&db);
            let dest = if n % 2 == 0 { "H1" } else { "S1" };
            tokio::spawn(async move {
                orch.record_inward(dest, "HMSI (OEM)", None, day(1), "", &items(1))
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(db.ledger().count().await.unwrap(), 16);
    assert_eq!(stock(&db, "H1").await, 8);
    assert_eq!(stock(&db, "S1").await, 8);
    db.close().await;
    remove_files(&path);
}

#[tokio::test]
async fn test_strict_policy_blocks_overdraw() {
    let db = network().await;
    let strict = db.orchestrator(StockPolicy::RejectNegative);

    strict
        .record_inward("H1", "HMSI (OEM)", None, day(1), "", &items(2))
        .await
        .unwrap();

    let err = strict
        .record_transfer("H1", "S1", day(2), "", &items(3))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Core(CoreError::InsufficientStock { .. })));

    let err = strict
        .record_adjustment("S1", &activa_red(), -1, day(2), "lost", "owner1")
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Core(CoreError::InsufficientStock { .. })));

    strict
        .record_transfer("H1", "S1", day(2), "", &items(2))
        .await
        .unwrap();
    assert_eq!(stock(&db, "H1").await, 0);
    assert_eq!(stock(&db, "S1").await, 2);
}

#[tokio::test]
async fn test_internal_inward_uses_bulk_remarks() {
    let db = network().await;
    let orch = writer(&db);
    let receipt = orch
        .record_inward("S1", "H1", Some("LD-9"), day(1), "", &items(1))
        .await
        .unwrap();

    let legs = db
        .ledger()
        .movement_legs(&receipt.movement_ids[0])
        .await
        .unwrap();
    assert_eq!(legs[0].remarks, "Bulk Transfer OUT.");
    assert_eq!(legs[1].remarks, "Bulk Transfer IN.");
    assert_eq!(legs[1].load_number.as_deref(), Some("LD-9"));
    assert_eq!(stock(&db, "H1").await, -1);
}

#[tokio::test]
async fn test_as_of_and_recent_transactions() {
    let db = network().await;
    let orch = writer(&db);
    for d in 1..=5 {
        orch.record_inward("H1", "HMSI (OEM)", None, day(d), "", &items(1))
            .await
            .unwrap();
    }
    orch.record_transfer("H1", "S1", day(6), "", &items(1))
        .await
        .unwrap();

    assert_eq!(
        db.stock().stock_for("H1", &activa_red(), Some(day(3))).await.unwrap(),
        3
    );
    // Repeated reads agree
    assert_eq!(stock(&db, "H1").await, stock(&db, "H1").await);

    // Newest first, limited only without a range
    let recent = db
        .ledger()
        .transactions_for_branches(&ids(&["S1"]), None, 100)
        .await
        .unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].transaction_type, TransactionType::InwardTransfer);

    let capped = db
        .ledger()
        .transactions_for_branches(&ids(&["H1"]), None, 3)
        .await
        .unwrap();
    assert_eq!(capped.len(), 3);
    assert_eq!(capped[0].date, day(6));

    let ranged = db
        .ledger()
        .transactions_for_branches(
            &ids(&["H1"]),
            Some(DateRange::new(day(2), day(4)).unwrap()),
            1,
        )
        .await
        .unwrap();
    assert_eq!(ranged.len(), 3);
    assert!(ranged.windows(2).all(|w| w[0].date >= w[1].date));
}

#[tokio::test]
async fn test_daily_transfer_summary_groups_outward_legs() {
    let db = network().await;
    let orch = writer(&db);
    orch.record_transfer("H1", "S1", day(1), "", &items(2))
        .await
        .unwrap();
    orch.record_transfer("H1", "S1", day(1), "", &items(3))
        .await
        .unwrap();
    orch.record_transfer("H1", "S2", day(2), "", &items(1))
        .await
        .unwrap();

    let summary = db.ledger().daily_transfer_summary(None).await.unwrap();
    assert_eq!(summary.len(), 2);
    assert_eq!(summary[0].date, day(2));
    assert_eq!(summary[0].to_branch, "Highway Outlet");
    assert_eq!(summary[1].from_branch, "Main Showroom");
    assert_eq!(summary[1].total_qty, 5);

    let since = db.ledger().daily_transfer_summary(Some(day(2))).await.unwrap();
    assert_eq!(since.len(), 1);
}

#[tokio::test]
async fn test_fulfillment_walkthrough() {
    let db = network().await;
    let repo = db.sales_records();
    let sale = repo
        .create(&NewSalesRecord {
            branch_id: "S1".into(),
            dc_number: "DC-42".into(),
            customer_name: "Ravi".into(),
            sales_staff: "anil".into(),
            model: "Activa".into(),
            variant: "STD".into(),
            paint_color: "Red".into(),
        })
        .await
        .unwrap();

    let assigned = repo.assign_pdi(sale.id, "mech_a").await.unwrap().unwrap();
    assert_eq!(assigned.fulfillment_status, FulfillmentStatus::PdiInProgress);

    let done = repo.complete_pdi(sale.id, "CH12345").await.unwrap().unwrap();
    assert_eq!(done.fulfillment_status, FulfillmentStatus::PdiComplete);
    assert_eq!(
        repo.get(sale.id).await.unwrap().unwrap().chassis_no.as_deref(),
        Some("CH12345")
    );

    let err = repo.complete_pdi(sale.id, "CH12345").await.unwrap_err();
    assert!(matches!(err, DbError::Core(CoreError::InvalidTransition { .. })));
}
