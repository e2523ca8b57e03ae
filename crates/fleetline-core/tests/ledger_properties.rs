//! Ledger property tests
//!
//! - Transfers move stock between branches without creating or destroying it
//! - Multi-branch projection never reports a zero line
//! - Projection agrees with per-item stock lookups

use chrono::NaiveDate;
use fleetline_core::ledger::Ledger;
use fleetline_core::posting::{plan_inward, plan_sale, plan_transfer, InwardSource};
use fleetline_core::types::{BatchItem, VehicleDescriptor};
use proptest::prelude::*;

const BRANCHES: [&str; 4] = ["H1", "S1", "S2", "S3"];
const COLORS: [&str; 3] = ["RED", "BLACK", "GREY"];

fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(n as u64)
}

fn descriptor(color: usize) -> VehicleDescriptor {
    VehicleDescriptor::new("Activa", "STD", COLORS[color])
}

fn branch_ids() -> Vec<String> {
    BRANCHES.iter().map(|b| b.to_string()).collect()
}

fn seeded_ledger() -> Ledger {
    let mut ledger = Ledger::new();
    for (i, branch) in BRANCHES.iter().enumerate() {
        ledger.name_branch(*branch, format!("Branch {}", i));
        for color in 0..COLORS.len() {
            let rows = plan_inward(
                branch,
                &InwardSource::External("HMSI (OEM)".into()),
                None,
                day(0),
                "",
                &[BatchItem::new(descriptor(color), 20)],
            )
            .unwrap();
            ledger.append_all(rows);
        }
    }
    ledger
}

/// (from index, to index, color index, quantity, day offset)
fn transfer_strategy() -> impl Strategy<Value = (usize, usize, usize, i64, u32)> {
    (0..BRANCHES.len(), 0..BRANCHES.len(), 0..COLORS.len(), 1i64..=30, 1u32..30)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Network total per descriptor is unchanged by any transfer sequence.
    #[test]
    fn prop_transfers_conserve_stock(
        transfers in prop::collection::vec(transfer_strategy(), 0..25)
    ) {
        let mut ledger = seeded_ledger();
        let before: Vec<i64> = (0..COLORS.len())
            .map(|c| ledger.network_total(&descriptor(c)))
            .collect();

        for (from, to, color, qty, offset) in transfers {
            if from == to {
                continue;
            }
            let rows = plan_transfer(
                BRANCHES[from],
                BRANCHES[to],
                day(offset),
                "",
                &[BatchItem::new(descriptor(color), qty)],
            )
            .unwrap();
            prop_assert_eq!(rows.len(), 2);
            ledger.append_all(rows);
        }

        for (c, total) in before.iter().enumerate() {
            let summed: i64 = BRANCHES
                .iter()
                .map(|b| ledger.stock_for(b, &descriptor(c), None))
                .sum();
            prop_assert_eq!(summed, *total);
        }
    }

    /// No zero lines, and every line matches the single-item lookup.
    #[test]
    fn prop_projection_matches_lookups(
        sales in prop::collection::vec((0..BRANCHES.len(), 0..COLORS.len(), 1i64..=20), 0..20),
        as_of in 0u32..5
    ) {
        let mut ledger = seeded_ledger();
        for (i, (branch, color, qty)) in sales.into_iter().enumerate() {
            let rows = plan_sale(
                BRANCHES[branch],
                day((i % 5) as u32),
                "",
                &[BatchItem::new(descriptor(color), qty)],
            )
            .unwrap();
            ledger.append_all(rows);
        }

        let lines = ledger.multi_branch_stock(&branch_ids(), Some(day(as_of)));
        for line in &lines {
            prop_assert_ne!(line.quantity, 0);
            let d = VehicleDescriptor::new(&line.model, &line.variant, &line.color);
            prop_assert_eq!(
                ledger.stock_for(&line.branch_id, &d, Some(day(as_of))),
                line.quantity
            );
        }

        let listed: i64 = lines.iter().map(|l| l.quantity).sum();
        let looked_up: i64 = BRANCHES
            .iter()
            .flat_map(|b| (0..COLORS.len()).map(move |c| (b, c)))
            .map(|(b, c)| ledger.stock_for(b, &descriptor(c), Some(day(as_of))))
            .sum();
        prop_assert_eq!(listed, looked_up);
    }
}
