//! # Posting Module
//!
//! Turns a user intent (inward, transfer, sale, adjustment) into the ledger
//! rows that represent it. Pure: the database layer persists the plan inside
//! one SQL transaction.
//!
//! ## Intents and Their Rows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Intent                         Rows per batch item                     │
//! │  ─────────────────────────────  ───────────────────────────────────     │
//! │  inward from OEM / external     INWARD_OEM at dest                      │
//! │  inward from branch A           OUTWARD_TRANSFER at A  (to = dest)      │
//! │                                 INWARD_TRANSFER at dest (from = A)      │
//! │  transfer A → B                 OUTWARD_TRANSFER at A  (to = B)         │
//! │                                 INWARD_TRANSFER at B   (from = A)       │
//! │  sale at B                      SALE at B                               │
//! │  adjustment at B                ADJUSTMENT at B (signed delta)          │
//! │                                                                         │
//! │  Both legs of a pair share date, descriptor, quantity and movement_id. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{BatchItem, NewTransaction, TransactionType, VehicleDescriptor};
use crate::validation::{
    validate_adjustment_delta, validate_adjustment_reason, validate_batch_len,
    validate_branch_id, validate_quantity, validate_remarks, validate_required,
    validate_stock_count, ValidationResult,
};
use crate::MAX_ADJUSTMENT_QUANTITY;

// =============================================================================
// Inward Source
// =============================================================================

/// Where an inward delivery comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "value")]
#[ts(export)]
pub enum InwardSource {
    /// Another branch in the network (internal movement).
    Branch(String),
    /// Anything outside the network, e.g. "HMSI (OEM)".
    External(String),
}

impl InwardSource {
    /// Classifies a raw source value against the branch registry.
    ///
    /// ## Example
    /// ```rust
    /// use fleetline_core::posting::InwardSource;
    ///
    /// let known = |id: &str| id == "H1";
    /// assert_eq!(InwardSource::resolve("H1", known), InwardSource::Branch("H1".into()));
    /// assert_eq!(
    ///     InwardSource::resolve("HMSI (OEM)", known),
    ///     InwardSource::External("HMSI (OEM)".into())
    /// );
    /// ```
    pub fn resolve(source: &str, is_branch: impl Fn(&str) -> bool) -> Self {
        let source = source.trim();
        if is_branch(source) {
            InwardSource::Branch(source.to_string())
        } else {
            InwardSource::External(source.to_string())
        }
    }
}

// =============================================================================
// Stock Policy
// =============================================================================

/// Whether a write may take a stock tuple below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum StockPolicy {
    /// Negative stock is recorded as-is.
    #[default]
    AllowNegative,
    /// Outbound rows must be covered by on-hand stock.
    RejectNegative,
}

/// Net stock change per (branch, descriptor) across a planned batch.
///
/// Ordered by key so checks run deterministically.
pub fn net_changes(rows: &[NewTransaction]) -> BTreeMap<(String, VehicleDescriptor), i64> {
    let mut changes = BTreeMap::new();
    for row in rows {
        *changes
            .entry((row.current_branch_id.clone(), row.descriptor.clone()))
            .or_insert(0) += row.transaction_type.contribution(row.quantity);
    }
    changes
}

/// Checks one tuple's planned change against on-hand stock.
///
/// Only decreases are checked, and only under [`StockPolicy::RejectNegative`].
pub fn check_stock(
    policy: StockPolicy,
    branch_id: &str,
    descriptor: &VehicleDescriptor,
    available: i64,
    change: i64,
) -> CoreResult<()> {
    if policy == StockPolicy::AllowNegative || change >= 0 {
        return Ok(());
    }
    if available.checked_add(change).map_or(true, |left| left < 0) {
        return Err(CoreError::InsufficientStock {
            branch_id: branch_id.to_string(),
            descriptor: descriptor.to_string(),
            available,
            requested: change.saturating_neg(),
        });
    }
    Ok(())
}

// =============================================================================
// Plans
// =============================================================================

/// Validates a submitted batch and returns normalized (descriptor, qty) lines.
fn validated_lines(items: &[BatchItem]) -> CoreResult<Vec<(VehicleDescriptor, i64)>> {
    validate_batch_len(items.len())?;
    items
        .iter()
        .map(|item| {
            let descriptor = item.descriptor();
            descriptor.ensure_complete()?;
            validate_quantity(item.quantity)?;
            Ok((descriptor, item.quantity))
        })
        .collect()
}

fn prefixed(prefix: &str, remarks: &str) -> String {
    format!("{} {}", prefix, remarks.trim()).trim_end().to_string()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// One OUTWARD/INWARD pair sharing a fresh movement id.
#[allow(clippy::too_many_arguments)]
fn transfer_pair(
    from: &str,
    to: &str,
    date: NaiveDate,
    descriptor: VehicleDescriptor,
    quantity: i64,
    out_remarks: String,
    in_remarks: String,
    load_number: Option<String>,
) -> [NewTransaction; 2] {
    let movement_id = Uuid::new_v4().to_string();
    [
        NewTransaction {
            date,
            transaction_type: TransactionType::OutwardTransfer,
            source_external: None,
            from_branch_id: None,
            current_branch_id: from.to_string(),
            to_branch_id: Some(to.to_string()),
            movement_id: Some(movement_id.clone()),
            descriptor: descriptor.clone(),
            quantity,
            load_number: None,
            remarks: out_remarks,
        },
        NewTransaction {
            date,
            transaction_type: TransactionType::InwardTransfer,
            source_external: None,
            from_branch_id: Some(from.to_string()),
            current_branch_id: to.to_string(),
            to_branch_id: None,
            movement_id: Some(movement_id),
            descriptor,
            quantity,
            load_number,
            remarks: in_remarks,
        },
    ]
}

/// Plans an inward delivery to `dest`.
///
/// ## Arguments
/// * `source` - resolved origin; a branch source produces transfer pairs
/// * `load_number` - external reference, kept on the receiving row only
///
/// ## Errors
/// `Validation` for an empty batch, bad quantity, blank descriptor part or
/// a branch source equal to `dest`.
pub fn plan_inward(
    dest: &str,
    source: &InwardSource,
    load_number: Option<&str>,
    date: NaiveDate,
    remarks: &str,
    items: &[BatchItem],
) -> CoreResult<Vec<NewTransaction>> {
    validate_branch_id(dest)?;
    validate_remarks(remarks)?;
    let lines = validated_lines(items)?;
    let load_number = non_empty(load_number);

    match source {
        InwardSource::Branch(from) => {
            if from == dest {
                return Err(ValidationError::InvalidFormat {
                    field: "source".to_string(),
                    reason: format!("source and destination are both {}", dest),
                }
                .into());
            }
            Ok(lines
                .into_iter()
                .flat_map(|(descriptor, quantity)| {
                    transfer_pair(
                        from,
                        dest,
                        date,
                        descriptor,
                        quantity,
                        prefixed("Bulk Transfer OUT.", remarks),
                        prefixed("Bulk Transfer IN.", remarks),
                        load_number.clone(),
                    )
                })
                .collect())
        }
        InwardSource::External(label) => {
            let label = validate_required("source", label)?;
            Ok(lines
                .into_iter()
                .map(|(descriptor, quantity)| NewTransaction {
                    date,
                    transaction_type: TransactionType::InwardOem,
                    source_external: Some(label.clone()),
                    from_branch_id: None,
                    current_branch_id: dest.to_string(),
                    to_branch_id: None,
                    movement_id: None,
                    descriptor,
                    quantity,
                    load_number: load_number.clone(),
                    remarks: remarks.trim().to_string(),
                })
                .collect())
        }
    }
}

/// Plans a branch-to-branch transfer: one pair per item.
///
/// Destination membership is checked by the caller against the hierarchy;
/// this only rejects `from == to`.
pub fn plan_transfer(
    from: &str,
    to: &str,
    date: NaiveDate,
    remarks: &str,
    items: &[BatchItem],
) -> CoreResult<Vec<NewTransaction>> {
    validate_branch_id(from)?;
    validate_branch_id(to)?;
    validate_remarks(remarks)?;
    if from == to {
        return Err(CoreError::InvalidDestination {
            from: from.to_string(),
            to: to.to_string(),
        });
    }
    let lines = validated_lines(items)?;

    Ok(lines
        .into_iter()
        .flat_map(|(descriptor, quantity)| {
            transfer_pair(
                from,
                to,
                date,
                descriptor,
                quantity,
                prefixed("Transfer OUT.", remarks),
                prefixed("Transfer IN.", remarks),
                None,
            )
        })
        .collect())
}

/// Plans one SALE row per item at `branch`.
pub fn plan_sale(
    branch: &str,
    date: NaiveDate,
    remarks: &str,
    items: &[BatchItem],
) -> CoreResult<Vec<NewTransaction>> {
    validate_branch_id(branch)?;
    validate_remarks(remarks)?;
    let lines = validated_lines(items)?;

    Ok(lines
        .into_iter()
        .map(|(descriptor, quantity)| NewTransaction {
            date,
            transaction_type: TransactionType::Sale,
            source_external: None,
            from_branch_id: None,
            current_branch_id: branch.to_string(),
            to_branch_id: None,
            movement_id: None,
            descriptor,
            quantity,
            load_number: None,
            remarks: remarks.trim().to_string(),
        })
        .collect())
}

/// Delta that brings `current` stock to `desired`.
///
/// ## Errors
/// `OutOfRange` when `desired` is not a valid count or the correction is
/// larger than MAX_ADJUSTMENT_QUANTITY.
///
/// ## Example
/// ```rust
/// use fleetline_core::posting::adjustment_delta;
///
/// assert_eq!(adjustment_delta(2, 3).unwrap(), -1);
/// assert_eq!(adjustment_delta(4, 4).unwrap(), 0);
/// assert!(adjustment_delta(i64::MAX, -1).is_err());
/// ```
pub fn adjustment_delta(desired: i64, current: i64) -> ValidationResult<i64> {
    validate_stock_count(desired)?;
    let delta = desired
        .checked_sub(current)
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "delta".to_string(),
            min: -MAX_ADJUSTMENT_QUANTITY,
            max: MAX_ADJUSTMENT_QUANTITY,
        })?;
    validate_adjustment_delta(delta)?;
    Ok(delta)
}

/// Plans a manual stock correction.
///
/// ## Returns
/// `None` when `delta` is zero (nothing to record).
#[allow(clippy::too_many_arguments)]
pub fn plan_adjustment(
    branch: &str,
    descriptor: &VehicleDescriptor,
    delta: i64,
    date: NaiveDate,
    reason: &str,
    actor: &str,
) -> CoreResult<Option<NewTransaction>> {
    validate_branch_id(branch)?;
    descriptor.ensure_complete()?;
    let reason = validate_adjustment_reason(reason)?;
    let actor = validate_required("actor", actor)?;
    validate_adjustment_delta(delta)?;

    if delta == 0 {
        return Ok(None);
    }

    Ok(Some(NewTransaction {
        date,
        transaction_type: TransactionType::Adjustment,
        source_external: None,
        from_branch_id: None,
        current_branch_id: branch.to_string(),
        to_branch_id: None,
        movement_id: None,
        descriptor: descriptor.clone(),
        quantity: delta,
        load_number: None,
        remarks: format!("ADJUSTMENT by {}: {}", actor, reason),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    fn items(qty: i64) -> Vec<BatchItem> {
        vec![BatchItem::new(VehicleDescriptor::new("Activa", "STD", "Red"), qty)]
    }

    #[test]
    fn test_external_inward_single_row() {
        let rows = plan_inward(
            "H1",
            &InwardSource::External("HMSI (OEM)".into()),
            Some("INV-1"),
            date(),
            "",
            &items(5),
        )
        .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].transaction_type, TransactionType::InwardOem);
        assert_eq!(rows[0].source_external.as_deref(), Some("HMSI (OEM)"));
        assert_eq!(rows[0].load_number.as_deref(), Some("INV-1"));
        assert_eq!(rows[0].movement_id, None);
    }

    #[test]
    fn test_internal_inward_makes_linked_pairs() {
        let rows = plan_inward(
            "S1",
            &InwardSource::Branch("H1".into()),
            Some("LD-7"),
            date(),
            "truck 3",
            &items(2),
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        let (out, inn) = (&rows[0], &rows[1]);
        assert_eq!(out.transaction_type, TransactionType::OutwardTransfer);
        assert_eq!(out.current_branch_id, "H1");
        assert_eq!(out.to_branch_id.as_deref(), Some("S1"));
        assert_eq!(out.remarks, "Bulk Transfer OUT. truck 3");
        assert_eq!(out.load_number, None);

        assert_eq!(inn.transaction_type, TransactionType::InwardTransfer);
        assert_eq!(inn.current_branch_id, "S1");
        assert_eq!(inn.from_branch_id.as_deref(), Some("H1"));
        assert_eq!(inn.remarks, "Bulk Transfer IN. truck 3");
        assert_eq!(inn.load_number.as_deref(), Some("LD-7"));

        assert!(out.movement_id.is_some());
        assert_eq!(out.movement_id, inn.movement_id);
    }

    #[test]
    fn test_inward_from_self_rejected() {
        let err = plan_inward(
            "H1",
            &InwardSource::Branch("H1".into()),
            None,
            date(),
            "",
            &items(1),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_transfer_pairs_have_distinct_movements() {
        let two = vec![
            BatchItem::new(VehicleDescriptor::new("Activa", "STD", "Red"), 1),
            BatchItem::new(VehicleDescriptor::new("Shine", "DLX", "Black"), 3),
        ];
        let rows = plan_transfer("H1", "S1", date(), "", &two).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].movement_id, rows[1].movement_id);
        assert_ne!(rows[0].movement_id, rows[2].movement_id);
        assert_eq!(rows[0].remarks, "Transfer OUT.");
        assert_eq!(rows[1].remarks, "Transfer IN.");
    }

    #[test]
    fn test_transfer_rejects_same_branch_and_bad_batches() {
        assert!(matches!(
            plan_transfer("H1", "H1", date(), "", &items(1)),
            Err(CoreError::InvalidDestination { .. })
        ));
        assert!(plan_transfer("H1", "S1", date(), "", &[]).is_err());
        assert!(plan_transfer("H1", "S1", date(), "", &items(0)).is_err());
        assert!(plan_transfer("H1", "S1", date(), "", &items(1000)).is_err());
    }

    #[test]
    fn test_transfer_conserves_network_stock() {
        let mut ledger = Ledger::new();
        ledger.append_all(
            plan_inward("H1", &InwardSource::External("OEM".into()), None, date(), "", &items(5))
                .unwrap(),
        );
        ledger.append_all(plan_transfer("H1", "S1", date(), "", &items(2)).unwrap());

        let d = VehicleDescriptor::new("activa", "std", "red");
        assert_eq!(ledger.stock_for("H1", &d, None), 3);
        assert_eq!(ledger.stock_for("S1", &d, None), 2);
        assert_eq!(ledger.network_total(&d), 5);
    }

    #[test]
    fn test_sale_rows() {
        let rows = plan_sale("S1", date(), " walk-in ", &items(2)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].transaction_type, TransactionType::Sale);
        assert_eq!(rows[0].quantity, 2);
        assert_eq!(rows[0].remarks, "walk-in");
    }

    #[test]
    fn test_adjustment_plan() {
        let d = VehicleDescriptor::new("Activa", "STD", "Red");
        let row = plan_adjustment("H1", &d, -1, date(), " damaged unit ", "owner1")
            .unwrap()
            .unwrap();
        assert_eq!(row.quantity, -1);
        assert_eq!(row.remarks, "ADJUSTMENT by owner1: damaged unit");

        assert!(plan_adjustment("H1", &d, 0, date(), "recount", "owner1")
            .unwrap()
            .is_none());
        assert!(plan_adjustment("H1", &d, 3, date(), "", "owner1").is_err());
    }

    #[test]
    fn test_adjustment_size_is_capped() {
        let d = VehicleDescriptor::new("Activa", "STD", "Red");
        let err = plan_adjustment("H1", &d, i64::MAX, date(), "recount", "owner1").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
        assert!(plan_adjustment("H1", &d, -MAX_ADJUSTMENT_QUANTITY, date(), "recount", "owner1")
            .unwrap()
            .is_some());

        assert_eq!(adjustment_delta(5, -3).unwrap(), 8);
        assert!(adjustment_delta(i64::MAX, -1).is_err());
        assert!(adjustment_delta(0, i64::MIN).is_err());
        assert!(adjustment_delta(-1, 0).is_err());
        assert!(adjustment_delta(MAX_ADJUSTMENT_QUANTITY, -1).is_err());
    }

    #[test]
    fn test_stock_check_policy() {
        let d = VehicleDescriptor::new("Activa", "STD", "Red");
        assert!(check_stock(StockPolicy::AllowNegative, "S1", &d, 0, -5).is_ok());
        assert!(check_stock(StockPolicy::RejectNegative, "S1", &d, 5, -5).is_ok());
        assert!(check_stock(StockPolicy::RejectNegative, "S1", &d, 0, 3).is_ok());

        assert!(check_stock(StockPolicy::RejectNegative, "S1", &d, i64::MIN, -1).is_err());

        let err = check_stock(StockPolicy::RejectNegative, "S1", &d, 1, -2).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 1,
                requested: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_net_changes_accumulate_across_batch() {
        let two = vec![
            BatchItem::new(VehicleDescriptor::new("Activa", "STD", "Red"), 2),
            BatchItem::new(VehicleDescriptor::new("activa", "std", "red"), 3),
        ];
        let rows = plan_sale("S1", date(), "", &two).unwrap();
        let changes = net_changes(&rows);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.values().copied().collect::<Vec<_>>(), vec![-5]);
    }
}
