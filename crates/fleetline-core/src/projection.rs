//! # Projection Module
//!
//! Drill-down over one fetched stock snapshot. No queries happen between
//! steps; every view is a filter of the same [`StockLine`] set.
//!
//! ## Drill-Down Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  multi_branch_stock(territory)        one query                        │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  model_totals()            ACTIVA 12 │ SHINE 4                         │
//! │         │ pick ACTIVA                                                   │
//! │         ▼                                                               │
//! │  variant_totals("ACTIVA")  STD 9 │ DLX 3                               │
//! │         │ pick STD                                                      │
//! │         ▼                                                               │
//! │  color_matrix("ACTIVA","STD")                                          │
//! │         color   │ Head One │ Sub One │ TOTAL                           │
//! │         RED     │    3     │    2    │   5                             │
//! │         BLACK   │    4     │    0    │   4                             │
//! │         TOTAL   │    7     │    2    │   9                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::StockLine;
use crate::TOTAL_LABEL;

// =============================================================================
// Snapshot
// =============================================================================

/// A labelled quantity (one drill-down row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Total {
    pub label: String,
    pub quantity: i64,
}

/// Net stock lines for a branch set, plus drill-down helpers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockSnapshot {
    pub lines: Vec<StockLine>,
}

impl StockSnapshot {
    pub fn new(lines: Vec<StockLine>) -> Self {
        StockSnapshot { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Territory headline number: sum of every line.
    pub fn total(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Per-model totals, sorted by model.
    pub fn model_totals(&self) -> Vec<Total> {
        sum_by(self.lines.iter(), |l| l.model.clone())
    }

    /// Per-variant totals within one model.
    pub fn variant_totals(&self, model: &str) -> Vec<Total> {
        sum_by(
            self.lines.iter().filter(|l| l.model == model),
            |l| l.variant.clone(),
        )
    }

    /// Color-by-branch matrix for one model and variant.
    pub fn color_matrix(&self, model: &str, variant: &str) -> ColorMatrix {
        ColorMatrix::build(
            self.lines
                .iter()
                .filter(|l| l.model == model && l.variant == variant),
        )
    }
}

fn sum_by<'a>(
    lines: impl Iterator<Item = &'a StockLine>,
    key: impl Fn(&StockLine) -> String,
) -> Vec<Total> {
    let mut sums: BTreeMap<String, i64> = BTreeMap::new();
    for line in lines {
        *sums.entry(key(line)).or_insert(0) += line.quantity;
    }
    sums.into_iter()
        .map(|(label, quantity)| Total { label, quantity })
        .collect()
}

// =============================================================================
// Color Matrix
// =============================================================================

/// One color row: a cell per branch column, then the row total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MatrixRow {
    pub color: String,
    pub cells: Vec<i64>,
    pub total: i64,
}

/// One branch column of a [`ColorMatrix`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MatrixColumn {
    pub branch_id: String,
    /// Display name; two branches may share one.
    pub label: String,
}

/// Pivot of colors × branches with a TOTAL column and a TOTAL row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ColorMatrix {
    /// One column per branch id, sorted by label then id. The TOTAL column
    /// is implied by `MatrixRow::total`.
    pub columns: Vec<MatrixColumn>,
    /// Colors sorted alphabetically; the last row is labelled TOTAL.
    pub rows: Vec<MatrixRow>,
}

impl ColorMatrix {
    fn build<'a>(lines: impl Iterator<Item = &'a StockLine>) -> Self {
        let mut cells: BTreeMap<String, BTreeMap<String, i64>> = BTreeMap::new();
        let mut columns: Vec<MatrixColumn> = Vec::new();

        for line in lines {
            if !columns.iter().any(|c| c.branch_id == line.branch_id) {
                columns.push(MatrixColumn {
                    branch_id: line.branch_id.clone(),
                    label: line.branch_name.clone(),
                });
            }
            *cells
                .entry(line.color.clone())
                .or_default()
                .entry(line.branch_id.clone())
                .or_insert(0) += line.quantity;
        }

        if cells.is_empty() {
            return ColorMatrix::default();
        }
        columns.sort_by(|a, b| (&a.label, &a.branch_id).cmp(&(&b.label, &b.branch_id)));

        let mut rows: Vec<MatrixRow> = cells
            .into_iter()
            .map(|(color, by_branch)| {
                let row: Vec<i64> = columns
                    .iter()
                    .map(|c| by_branch.get(&c.branch_id).copied().unwrap_or(0))
                    .collect();
                MatrixRow {
                    color,
                    total: row.iter().sum(),
                    cells: row,
                }
            })
            .collect();

        let column_totals: Vec<i64> = (0..columns.len())
            .map(|i| rows.iter().map(|r| r.cells[i]).sum())
            .collect();
        rows.push(MatrixRow {
            color: TOTAL_LABEL.to_string(),
            total: column_totals.iter().sum(),
            cells: column_totals,
        });

        ColorMatrix { columns, rows }
    }

    /// Quantity at (color, branch id); 0 for an empty cell.
    pub fn cell(&self, color: &str, branch_id: &str) -> i64 {
        let Some(column) = self.columns.iter().position(|c| c.branch_id == branch_id) else {
            return 0;
        };
        self.rows
            .iter()
            .find(|r| r.color == color)
            .map_or(0, |r| r.cells[column])
    }

    /// The TOTAL row, if the matrix has any data.
    pub fn total_row(&self) -> Option<&MatrixRow> {
        self.rows.last().filter(|r| r.color == TOTAL_LABEL)
    }

    /// Grand total (bottom-right cell).
    pub fn grand_total(&self) -> i64 {
        self.total_row().map_or(0, |r| r.total)
    }
}
