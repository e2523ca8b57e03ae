//! # Ledger Module
//!
//! The stock sign convention and an in-memory reference ledger.
//!
//! ## Sign Convention
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  transaction_type      contribution to current_branch_id                │
//! │  ───────────────────   ─────────────────────────────────                │
//! │  INWARD_OEM            +quantity                                        │
//! │  INWARD_TRANSFER       +quantity                                        │
//! │  OUTWARD_TRANSFER      -quantity                                        │
//! │  SALE                  -quantity                                        │
//! │  ADJUSTMENT            quantity as stored (already signed)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every stock figure in the system is a sum of these contributions. The
//! SQLite projection in fleetline-db generates its `CASE` expression from
//! [`Direction`] so both folds agree.
//!
//! ## Reference Ledger
//! [`Ledger`] keeps rows in a `Vec` and answers the same questions as the
//! database store. Property tests compare the two.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};

use crate::types::{
    DateRange, InventoryTransaction, NewTransaction, StockLine, TransactionType, VehicleDescriptor,
};

// =============================================================================
// Sign Convention
// =============================================================================

/// How a transaction type moves stock at its `current_branch_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Adds `quantity`.
    Inbound,
    /// Subtracts `quantity`.
    Outbound,
    /// Adds the stored quantity, which carries its own sign.
    Signed,
}

impl TransactionType {
    /// Direction of this type under the sign convention.
    pub fn direction(&self) -> Direction {
        match self {
            TransactionType::InwardOem | TransactionType::InwardTransfer => Direction::Inbound,
            TransactionType::OutwardTransfer | TransactionType::Sale => Direction::Outbound,
            TransactionType::Adjustment => Direction::Signed,
        }
    }

    /// Signed stock contribution of a row of this type.
    ///
    /// ## Example
    /// ```rust
    /// use fleetline_core::TransactionType;
    ///
    /// assert_eq!(TransactionType::InwardOem.contribution(5), 5);
    /// assert_eq!(TransactionType::Sale.contribution(2), -2);
    /// assert_eq!(TransactionType::Adjustment.contribution(-1), -1);
    /// ```
    pub fn contribution(&self, quantity: i64) -> i64 {
        match self.direction() {
            Direction::Inbound => quantity,
            Direction::Outbound => -quantity,
            Direction::Signed => quantity,
        }
    }

    /// Types whose contribution is `+quantity`.
    pub fn inbound() -> impl Iterator<Item = TransactionType> {
        TransactionType::ALL
            .into_iter()
            .filter(|t| t.direction() == Direction::Inbound)
    }

    /// Types whose contribution is `-quantity`.
    pub fn outbound() -> impl Iterator<Item = TransactionType> {
        TransactionType::ALL
            .into_iter()
            .filter(|t| t.direction() == Direction::Outbound)
    }
}

impl InventoryTransaction {
    /// Signed contribution of this row to its current branch.
    pub fn contribution(&self) -> i64 {
        self.transaction_type.contribution(self.quantity)
    }
}

/// True when a row dated `date` is visible at `as_of` (None = all history).
fn visible_at(date: NaiveDate, as_of: Option<NaiveDate>) -> bool {
    as_of.map_or(true, |as_of| date <= as_of)
}

// =============================================================================
// Reference Ledger
// =============================================================================

/// Append-only, in-memory ledger.
///
/// Ids are assigned from 1 in insert order. Nothing can be updated or
/// removed once appended.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    rows: Vec<InventoryTransaction>,
    /// branch_id → branch_name, for projection output.
    branch_names: BTreeMap<String, String>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a display name used in [`StockLine::branch_name`].
    pub fn name_branch(&mut self, branch_id: impl Into<String>, branch_name: impl Into<String>) {
        self.branch_names.insert(branch_id.into(), branch_name.into());
    }

    /// Appends one row and returns its id.
    pub fn append(&mut self, row: NewTransaction) -> i64 {
        let id = self.rows.len() as i64 + 1;
        self.rows.push(row.into_stored(id, Utc::now()));
        id
    }

    /// Appends rows in order and returns their ids.
    pub fn append_all(&mut self, rows: impl IntoIterator<Item = NewTransaction>) -> Vec<i64> {
        rows.into_iter().map(|row| self.append(row)).collect()
    }

    /// Every stored row in insert order.
    pub fn rows(&self) -> &[InventoryTransaction] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Net stock of one descriptor at one branch. 0 when nothing matches.
    pub fn stock_for(
        &self,
        branch_id: &str,
        descriptor: &VehicleDescriptor,
        as_of: Option<NaiveDate>,
    ) -> i64 {
        self.rows
            .iter()
            .filter(|row| row.current_branch_id == branch_id)
            .filter(|row| {
                row.model == descriptor.model
                    && row.variant == descriptor.variant
                    && row.color == descriptor.color
            })
            .filter(|row| visible_at(row.date, as_of))
            .map(InventoryTransaction::contribution)
            .sum()
    }

    /// Grouped net stock over a branch set, zero groups suppressed.
    ///
    /// Ordered by branch name, model, variant, color.
    pub fn multi_branch_stock(
        &self,
        branch_ids: &[String],
        as_of: Option<NaiveDate>,
    ) -> Vec<StockLine> {
        let mut sums: BTreeMap<(String, String, VehicleDescriptor), i64> = BTreeMap::new();

        for row in self
            .rows
            .iter()
            .filter(|row| branch_ids.contains(&row.current_branch_id))
            .filter(|row| visible_at(row.date, as_of))
        {
            let name = self
                .branch_names
                .get(&row.current_branch_id)
                .cloned()
                .unwrap_or_else(|| row.current_branch_id.clone());
            *sums
                .entry((name, row.current_branch_id.clone(), row.descriptor()))
                .or_insert(0) += row.contribution();
        }

        sums.into_iter()
            .filter(|(_, quantity)| *quantity != 0)
            .map(|((branch_name, branch_id, d), quantity)| StockLine {
                branch_id,
                branch_name,
                model: d.model,
                variant: d.variant,
                color: d.color,
                quantity,
            })
            .collect()
    }

    /// Rows touching any branch in the set, newest first.
    ///
    /// Without a range the result is capped at `limit` rows, taken after
    /// ordering.
    pub fn transactions_for_branches(
        &self,
        branch_ids: &[String],
        range: Option<DateRange>,
        limit: usize,
    ) -> Vec<InventoryTransaction> {
        let mut rows: Vec<InventoryTransaction> = self
            .rows
            .iter()
            .filter(|row| branch_ids.iter().any(|b| row.touches(b)))
            .filter(|row| range.map_or(true, |r| r.contains(row.date)))
            .cloned()
            .collect();

        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));

        if range.is_none() {
            rows.truncate(limit);
        }
        rows
    }

    /// Sum of stock for one descriptor across every branch in the ledger.
    pub fn network_total(&self, descriptor: &VehicleDescriptor) -> i64 {
        self.rows
            .iter()
            .filter(|row| &row.descriptor() == descriptor)
            .map(InventoryTransaction::contribution)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn row(kind: TransactionType, branch: &str, qty: i64, day: u32) -> NewTransaction {
        NewTransaction {
            date: date(day),
            transaction_type: kind,
            source_external: None,
            from_branch_id: None,
            current_branch_id: branch.to_string(),
            to_branch_id: None,
            movement_id: None,
            descriptor: VehicleDescriptor::new("Activa", "STD", "Red"),
            quantity: qty,
            load_number: None,
            remarks: String::new(),
        }
    }

    fn activa() -> VehicleDescriptor {
        VehicleDescriptor::new("Activa", "STD", "Red")
    }

    #[test]
    fn test_sign_convention() {
        assert_eq!(TransactionType::InwardOem.contribution(3), 3);
        assert_eq!(TransactionType::InwardTransfer.contribution(3), 3);
        assert_eq!(TransactionType::OutwardTransfer.contribution(3), -3);
        assert_eq!(TransactionType::Sale.contribution(3), -3);
        assert_eq!(TransactionType::Adjustment.contribution(-3), -3);
        assert_eq!(TransactionType::Adjustment.contribution(4), 4);

        let inbound: Vec<_> = TransactionType::inbound().collect();
        assert_eq!(
            inbound,
            vec![TransactionType::InwardOem, TransactionType::InwardTransfer]
        );
        let outbound: Vec<_> = TransactionType::outbound().collect();
        assert_eq!(
            outbound,
            vec![TransactionType::OutwardTransfer, TransactionType::Sale]
        );
    }

    #[test]
    fn test_stock_for_empty_is_zero() {
        let ledger = Ledger::new();
        assert_eq!(ledger.stock_for("H1", &activa(), None), 0);
    }

    #[test]
    fn test_stock_for_as_of() {
        let mut ledger = Ledger::new();
        ledger.append(row(TransactionType::InwardOem, "H1", 5, 1));
        ledger.append(row(TransactionType::Sale, "H1", 2, 3));

        assert_eq!(ledger.stock_for("H1", &activa(), None), 3);
        assert_eq!(ledger.stock_for("H1", &activa(), Some(date(2))), 5);
        assert_eq!(ledger.stock_for("H1", &activa(), Some(date(3))), 3);
        assert_eq!(ledger.stock_for("S1", &activa(), None), 0);
    }

    #[test]
    fn test_multi_branch_stock_suppresses_zero() {
        let mut ledger = Ledger::new();
        ledger.name_branch("H1", "Head One");
        ledger.name_branch("S1", "Sub One");
        ledger.append(row(TransactionType::InwardOem, "H1", 5, 1));
        ledger.append(row(TransactionType::InwardOem, "S1", 2, 1));
        ledger.append(row(TransactionType::Sale, "S1", 2, 2));

        let lines = ledger.multi_branch_stock(&["H1".to_string(), "S1".to_string()], None);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].branch_id, "H1");
        assert_eq!(lines[0].branch_name, "Head One");
        assert_eq!(lines[0].quantity, 5);
    }

    #[test]
    fn test_multi_branch_stock_keeps_negative() {
        let mut ledger = Ledger::new();
        ledger.append(row(TransactionType::Sale, "H1", 1, 1));
        let lines = ledger.multi_branch_stock(&["H1".to_string()], None);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, -1);
    }

    #[test]
    fn test_transactions_for_branches_order_and_limit() {
        let mut ledger = Ledger::new();
        let first = ledger.append(row(TransactionType::InwardOem, "H1", 1, 2));
        let second = ledger.append(row(TransactionType::InwardOem, "H1", 1, 2));
        let older = ledger.append(row(TransactionType::InwardOem, "H1", 1, 1));
        ledger.append(row(TransactionType::InwardOem, "X9", 1, 5));

        let rows = ledger.transactions_for_branches(&["H1".to_string()], None, 100);
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second, first, older]);

        let capped = ledger.transactions_for_branches(&["H1".to_string()], None, 1);
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].id, second);

        let ranged = ledger.transactions_for_branches(
            &["H1".to_string()],
            Some(DateRange::new(date(1), date(1)).unwrap()),
            1,
        );
        assert_eq!(ranged.len(), 1);
        assert_eq!(ranged[0].id, older);

        assert!(ledger.transactions_for_branches(&[], None, 100).is_empty());
    }

    #[test]
    fn test_transactions_visible_from_either_endpoint() {
        let mut ledger = Ledger::new();
        let mut outward = row(TransactionType::OutwardTransfer, "H1", 2, 1);
        outward.to_branch_id = Some("S1".to_string());
        ledger.append(outward);

        let rows = ledger.transactions_for_branches(&["S1".to_string()], None, 100);
        assert_eq!(rows.len(), 1);
    }
}
