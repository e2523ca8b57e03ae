//! # Catalog Commands
//!
//! Read-only views of the vehicle price list.

use serde::{Deserialize, Serialize};
use tracing::debug;

use fleetline_core::catalog::PriceBreakdown;
use fleetline_core::{VehicleCatalog, VehiclePrice};

use crate::error::{ApiError, ApiResult};
use crate::state::{DbState, MasterDataCache};

/// Price row with parsed colors and typed amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePriceDto {
    pub model: String,
    pub variant: String,
    pub colors: Vec<String>,
    pub breakdown: PriceBreakdown,
    /// False when stored totals disagree with their components.
    pub consistent: bool,
}

impl From<VehiclePrice> for VehiclePriceDto {
    fn from(price: VehiclePrice) -> Self {
        let breakdown = price.breakdown();
        VehiclePriceDto {
            colors: price.colors(),
            consistent: breakdown.is_consistent(),
            breakdown,
            model: price.model,
            variant: price.variant,
        }
    }
}

/// model → variant → colors, served from the master-data cache.
pub async fn vehicle_catalog(db: &DbState, cache: &MasterDataCache) -> ApiResult<VehicleCatalog> {
    let catalog = cache.catalog(db.inner()).await?;
    debug!(models = catalog.len(), "vehicle_catalog command");
    Ok(catalog.as_ref().clone())
}

/// Price breakdown for one model and variant.
///
/// ## Errors
/// `NotFound` when the price list has no such row.
pub async fn vehicle_price(db: &DbState, model: &str, variant: &str) -> ApiResult<VehiclePriceDto> {
    debug!(model = %model, variant = %variant, "vehicle_price command");
    let price = db
        .inner()
        .catalog()
        .price(model, variant)
        .await?
        .ok_or_else(|| ApiError::not_found("Vehicle price", &format!("{} / {}", model, variant)))?;
    Ok(VehiclePriceDto::from(price))
}
