//! # Batch Accumulator
//!
//! Line items a user collects before submitting an inward, transfer or sale.
//!
//! ## Batch Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add(Activa/STD/Red, 2) ──► [ACTIVA/STD/RED × 2]                        │
//! │  add(activa/std/red, 1) ──► [ACTIVA/STD/RED × 3]        (merged)        │
//! │  add(Shine/DLX/Black, 1) ─► [ACTIVA/STD/RED × 3, SHINE/DLX/BLACK × 1]   │
//! │  remove(0) ───────────────► [SHINE/DLX/BLACK × 1]                       │
//! │                                                                         │
//! │  submit ── ok ──► subtract(submitted) drops the written lines           │
//! │         └─ err ─► batch left untouched for the user to fix              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A batch belongs to one session. The app layer owns the locking.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::BatchItem;
use crate::validation::validate_quantity;
use crate::{MAX_BATCH_ITEMS, MAX_ITEM_QUANTITY};

/// Which submit a batch feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum BatchKind {
    Inward,
    Transfer,
    Sales,
}

impl BatchKind {
    pub const ALL: [BatchKind; 3] = [BatchKind::Inward, BatchKind::Transfer, BatchKind::Sales];
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchKind::Inward => "inward",
            BatchKind::Transfer => "transfer",
            BatchKind::Sales => "sales",
        };
        f.write_str(name)
    }
}

/// Ordered list of pending lines, unique by normalized descriptor.
///
/// ## Invariants
/// - Every quantity is in 1..=999
/// - At most 100 distinct lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VehicleBatch {
    items: Vec<BatchItem>,
}

impl VehicleBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a line, merging into an existing line with the same descriptor.
    pub fn add(&mut self, item: BatchItem) -> CoreResult<()> {
        validate_quantity(item.quantity)?;
        let descriptor = item.descriptor();
        descriptor.ensure_complete()?;

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|line| line.descriptor() == descriptor)
        {
            let merged = existing.quantity + item.quantity;
            if merged > MAX_ITEM_QUANTITY {
                return Err(ValidationError::OutOfRange {
                    field: "quantity".to_string(),
                    min: 1,
                    max: MAX_ITEM_QUANTITY,
                }
                .into());
            }
            existing.quantity = merged;
            return Ok(());
        }

        if self.items.len() >= MAX_BATCH_ITEMS {
            return Err(ValidationError::OutOfRange {
                field: "items".to_string(),
                min: 1,
                max: MAX_BATCH_ITEMS as i64,
            }
            .into());
        }

        self.items.push(BatchItem::new(descriptor, item.quantity));
        Ok(())
    }

    /// Removes the line at `index` and returns it.
    pub fn remove(&mut self, index: usize) -> CoreResult<BatchItem> {
        if index >= self.items.len() {
            return Err(CoreError::not_found("Batch line", index.to_string()));
        }
        Ok(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Takes back the quantities of `submitted` from matching lines and drops
    /// lines that reach zero. Lines added since the submit was read stay.
    pub fn subtract(&mut self, submitted: &[BatchItem]) {
        for sent in submitted {
            let descriptor = sent.descriptor();
            if let Some(line) = self
                .items
                .iter_mut()
                .find(|line| line.descriptor() == descriptor)
            {
                line.quantity -= sent.quantity.min(line.quantity);
            }
        }
        self.items.retain(|line| line.quantity > 0);
    }

    /// Empties the batch, returning its lines.
    pub fn take(&mut self) -> Vec<BatchItem> {
        std::mem::take(&mut self.items)
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}
