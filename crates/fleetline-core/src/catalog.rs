//! # Vehicle Catalog
//!
//! Read-only reference data: which model / variant / color combinations
//! exist and what they cost.
//!
//! ```text
//!  vehicle_prices rows                      catalog tree
//!  ───────────────────────────────          ──────────────────────────────
//!  ACTIVA  STD  "Red, Black ,Grey"   ──►    ACTIVA ─┬─ DLX ── [N/A]
//!  ACTIVA  DLX  ""                          │       └─ STD ── [Black, Grey, Red]
//!  SHINE   DRUM "Blue"                      SHINE ─── DRUM ── [Blue]
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// Placeholder color for catalog rows without a color list.
pub const NO_COLOR: &str = "N/A";

/// model → variant → sorted colors.
pub type VehicleCatalog = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// One catalog row with its price components (minor units).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct VehiclePrice {
    pub id: i64,
    pub model: String,
    pub variant: String,
    /// Comma separated, as delivered by the price list.
    pub color_list: String,
    pub ex_showroom: i64,
    pub life_tax: i64,
    pub insurance: i64,
    pub on_road_price: i64,
    pub accessories: i64,
    pub extended_warranty: i64,
    pub handling_charges: i64,
    pub registration_charges: i64,
    pub final_price: i64,
}

/// Typed view of a price row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceBreakdown {
    pub ex_showroom: Money,
    pub life_tax: Money,
    pub insurance: Money,
    pub on_road_price: Money,
    pub accessories: Money,
    pub extended_warranty: Money,
    pub handling_charges: Money,
    pub registration_charges: Money,
    pub final_price: Money,
}

impl PriceBreakdown {
    /// Ex-showroom plus life tax plus insurance.
    pub fn computed_on_road(&self) -> Money {
        self.ex_showroom + self.life_tax + self.insurance
    }

    /// On-road plus every add-on.
    pub fn computed_final(&self) -> Money {
        [
            self.on_road_price,
            self.accessories,
            self.extended_warranty,
            self.handling_charges,
            self.registration_charges,
        ]
        .into_iter()
        .sum()
    }

    /// True when the stored totals match their components.
    pub fn is_consistent(&self) -> bool {
        self.computed_on_road() == self.on_road_price && self.computed_final() == self.final_price
    }
}

impl VehiclePrice {
    pub fn colors(&self) -> Vec<String> {
        parse_color_list(&self.color_list)
    }

    pub fn breakdown(&self) -> PriceBreakdown {
        PriceBreakdown {
            ex_showroom: Money::from_minor(self.ex_showroom),
            life_tax: Money::from_minor(self.life_tax),
            insurance: Money::from_minor(self.insurance),
            on_road_price: Money::from_minor(self.on_road_price),
            accessories: Money::from_minor(self.accessories),
            extended_warranty: Money::from_minor(self.extended_warranty),
            handling_charges: Money::from_minor(self.handling_charges),
            registration_charges: Money::from_minor(self.registration_charges),
            final_price: Money::from_minor(self.final_price),
        }
    }
}

/// Splits a comma separated color list, trimming and sorting.
///
/// An empty list yields `["N/A"]`.
pub fn parse_color_list(raw: &str) -> Vec<String> {
    let mut colors: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    if colors.is_empty() {
        return vec![NO_COLOR.to_string()];
    }
    colors.sort();
    colors
}

/// Builds the model → variant → colors tree.
pub fn build_catalog(rows: &[VehiclePrice]) -> VehicleCatalog {
    let mut catalog = VehicleCatalog::new();
    for row in rows {
        catalog
            .entry(row.model.clone())
            .or_default()
            .insert(row.variant.clone(), row.colors());
    }
    catalog
}
