//! # Domain Types
//!
//! Core domain types used throughout Fleetline.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────────┐   ┌─────────────────┐  │
//! │  │     Branch      │   │ InventoryTransaction │   │   StockLine     │  │
//! │  │  ─────────────  │   │  ──────────────────  │   │  ─────────────  │  │
//! │  │  branch_id      │◄──│  current_branch_id   │──►│  branch_id      │  │
//! │  │  branch_name    │   │  from / to branch    │   │  model/var/col  │  │
//! │  └─────────────────┘   │  transaction_type    │   │  quantity (net) │  │
//! │                        │  model/variant/color │   └─────────────────┘  │
//! │  ┌─────────────────┐   │  quantity            │                        │
//! │  │ HierarchyEdge   │   │  movement_id         │   ┌─────────────────┐  │
//! │  │  sub → parent   │   └──────────────────────┘   │ TransferSummary │  │
//! │  └─────────────────┘                              └─────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Descriptor Normalization
//! Model, variant and color are trimmed and uppercased when a descriptor is
//! built, so `"activa "` and `"ACTIVA"` land on the same stock tuple.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};

// =============================================================================
// Branch
// =============================================================================

/// A dealer location (head office or sub-dealer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Branch {
    /// Stable business identifier.
    pub branch_id: String,
    /// Display name.
    pub branch_name: String,
}

impl Branch {
    pub fn new(branch_id: impl Into<String>, branch_name: impl Into<String>) -> Self {
        Branch {
            branch_id: branch_id.into(),
            branch_name: branch_name.into(),
        }
    }
}

/// One parent link in the two-level branch tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct HierarchyEdge {
    pub sub_branch_id: String,
    pub parent_branch_id: String,
}

impl HierarchyEdge {
    pub fn new(sub_branch_id: impl Into<String>, parent_branch_id: impl Into<String>) -> Self {
        HierarchyEdge {
            sub_branch_id: sub_branch_id.into(),
            parent_branch_id: parent_branch_id.into(),
        }
    }
}

// =============================================================================
// Vehicle Descriptor
// =============================================================================

/// Model / variant / color triple identifying a stock line.
///
/// Always normalized: construct through [`VehicleDescriptor::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VehicleDescriptor {
    pub model: String,
    pub variant: String,
    pub color: String,
}

impl VehicleDescriptor {
    /// Builds a descriptor, trimming and uppercasing each part.
    pub fn new(model: &str, variant: &str, color: &str) -> Self {
        VehicleDescriptor {
            model: normalize_part(model),
            variant: normalize_part(variant),
            color: normalize_part(color),
        }
    }

    /// Returns an error naming the first empty part.
    pub fn ensure_complete(&self) -> CoreResult<()> {
        for (field, value) in [
            ("model", &self.model),
            ("variant", &self.variant),
            ("color", &self.color),
        ] {
            if value.is_empty() {
                return Err(ValidationError::Required {
                    field: field.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

impl fmt::Display for VehicleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.model, self.variant, self.color)
    }
}

/// Trims and uppercases one descriptor part.
pub fn normalize_part(value: &str) -> String {
    value.trim().to_uppercase()
}

// =============================================================================
// Transaction Type
// =============================================================================

/// Kind of ledger event.
///
/// The stock sign of each kind lives in [`crate::ledger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum TransactionType {
    /// Arrival from the manufacturer (outside the branch network).
    InwardOem,
    /// Arrival from another branch (receiving leg of a pair).
    InwardTransfer,
    /// Departure to another branch (sending leg of a pair).
    OutwardTransfer,
    /// Vehicle sold to a customer.
    Sale,
    /// Manual correction; quantity carries its own sign.
    Adjustment,
}

impl TransactionType {
    /// Every transaction type, in declaration order.
    pub const ALL: [TransactionType; 5] = [
        TransactionType::InwardOem,
        TransactionType::InwardTransfer,
        TransactionType::OutwardTransfer,
        TransactionType::Sale,
        TransactionType::Adjustment,
    ];

    /// Stored (database) name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::InwardOem => "INWARD_OEM",
            TransactionType::InwardTransfer => "INWARD_TRANSFER",
            TransactionType::OutwardTransfer => "OUTWARD_TRANSFER",
            TransactionType::Sale => "SALE",
            TransactionType::Adjustment => "ADJUSTMENT",
        }
    }

    /// True for the two legs of an inter-branch movement.
    pub fn is_transfer_leg(&self) -> bool {
        matches!(
            self,
            TransactionType::InwardTransfer | TransactionType::OutwardTransfer
        )
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "transaction_type".to_string(),
                allowed: TransactionType::ALL
                    .iter()
                    .map(|t| t.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Inventory Transaction (ledger row)
// =============================================================================

/// A stored, immutable ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryTransaction {
    /// Monotonic insert id (ordering tie-break).
    pub id: i64,
    /// Insert time, for audit.
    #[ts(as = "String")]
    pub recorded_at: DateTime<Utc>,
    /// Business-effective date.
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub transaction_type: TransactionType,
    /// Free-text origin outside the network (e.g. "HMSI (OEM)").
    pub source_external: Option<String>,
    pub from_branch_id: Option<String>,
    /// The branch whose stock this row affects.
    pub current_branch_id: String,
    pub to_branch_id: Option<String>,
    /// Shared by both legs of one transfer pair.
    pub movement_id: Option<String>,
    pub model: String,
    pub variant: String,
    pub color: String,
    pub quantity: i64,
    pub load_number: Option<String>,
    pub remarks: String,
}

impl InventoryTransaction {
    /// Returns the vehicle descriptor of this row.
    pub fn descriptor(&self) -> VehicleDescriptor {
        VehicleDescriptor {
            model: self.model.clone(),
            variant: self.variant.clone(),
            color: self.color.clone(),
        }
    }

    /// True when `branch_id` is any endpoint of this row.
    pub fn touches(&self, branch_id: &str) -> bool {
        self.current_branch_id == branch_id
            || self.from_branch_id.as_deref() == Some(branch_id)
            || self.to_branch_id.as_deref() == Some(branch_id)
    }
}

/// A ledger row about to be appended (no id or insert time yet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub transaction_type: TransactionType,
    pub source_external: Option<String>,
    pub from_branch_id: Option<String>,
    pub current_branch_id: String,
    pub to_branch_id: Option<String>,
    pub movement_id: Option<String>,
    pub descriptor: VehicleDescriptor,
    pub quantity: i64,
    pub load_number: Option<String>,
    pub remarks: String,
}

impl NewTransaction {
    /// Materializes the row with its assigned id and insert time.
    pub fn into_stored(self, id: i64, recorded_at: DateTime<Utc>) -> InventoryTransaction {
        InventoryTransaction {
            id,
            recorded_at,
            date: self.date,
            transaction_type: self.transaction_type,
            source_external: self.source_external,
            from_branch_id: self.from_branch_id,
            current_branch_id: self.current_branch_id,
            to_branch_id: self.to_branch_id,
            movement_id: self.movement_id,
            model: self.descriptor.model,
            variant: self.descriptor.variant,
            color: self.descriptor.color,
            quantity: self.quantity,
            load_number: self.load_number,
            remarks: self.remarks,
        }
    }
}

// =============================================================================
// Batch Item
// =============================================================================

/// One line of a user-assembled batch (inward, transfer or sale).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BatchItem {
    pub model: String,
    pub variant: String,
    pub color: String,
    pub quantity: i64,
}

impl BatchItem {
    pub fn new(descriptor: VehicleDescriptor, quantity: i64) -> Self {
        BatchItem {
            model: descriptor.model,
            variant: descriptor.variant,
            color: descriptor.color,
            quantity,
        }
    }

    /// Normalized descriptor of this line.
    pub fn descriptor(&self) -> VehicleDescriptor {
        VehicleDescriptor::new(&self.model, &self.variant, &self.color)
    }
}

// =============================================================================
// Projection Outputs
// =============================================================================

/// Net on-hand quantity for one (branch, model, variant, color) tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockLine {
    pub branch_id: String,
    pub branch_name: String,
    pub model: String,
    pub variant: String,
    pub color: String,
    pub quantity: i64,
}

/// Outward quantity moved between two branches on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TransferSummary {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub from_branch: String,
    pub to_branch: String,
    pub total_qty: i64,
}

// =============================================================================
// Date Range
// =============================================================================

/// Inclusive business-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub start: NaiveDate,
    #[ts(as = "String")]
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> CoreResult<Self> {
        if start > end {
            return Err(ValidationError::InvalidFormat {
                field: "date_range".to_string(),
                reason: format!("start {} is after end {}", start, end),
            }
            .into());
        }
        Ok(DateRange { start, end })
    }

    /// True when `date` falls inside the range (both ends inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

// =============================================================================
// Write Receipt
// =============================================================================

/// What a successful ledger write produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct WriteReceipt {
    /// Ids of every appended row, in insert order.
    pub transaction_ids: Vec<i64>,
    /// Movement ids of any transfer pairs written.
    pub movement_ids: Vec<String>,
}

impl WriteReceipt {
    pub fn row_count(&self) -> usize {
        self.transaction_ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_normalization() {
        let d = VehicleDescriptor::new(" activa ", "std", "Pearl Red");
        assert_eq!(d.model, "ACTIVA");
        assert_eq!(d.variant, "STD");
        assert_eq!(d.color, "PEARL RED");
        assert_eq!(d.to_string(), "ACTIVA/STD/PEARL RED");
    }

    #[test]
    fn test_descriptor_requires_all_parts() {
        assert!(VehicleDescriptor::new("Activa", "STD", "Red")
            .ensure_complete()
            .is_ok());
        assert!(VehicleDescriptor::new("Activa", "  ", "Red")
            .ensure_complete()
            .is_err());
    }

    #[test]
    fn test_transaction_type_parsing() {
        assert_eq!(
            "outward_transfer".parse::<TransactionType>().unwrap(),
            TransactionType::OutwardTransfer
        );
        assert_eq!("SALE".parse::<TransactionType>().unwrap(), TransactionType::Sale);
        assert!("HMSI".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_transaction_type_serde_names() {
        let json = serde_json::to_string(&TransactionType::InwardOem).unwrap();
        assert_eq!(json, "\"INWARD_OEM\"");
    }

    #[test]
    fn test_date_range() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let range = DateRange::new(a, b).unwrap();
        assert!(range.contains(a));
        assert!(range.contains(b));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));
        assert!(DateRange::new(b, a).is_err());
    }
}
