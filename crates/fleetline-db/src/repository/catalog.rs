//! # Catalog Repository
//!
//! Read access to `vehicle_prices`, plus the upsert used by the seed tool.

use sqlx::SqlitePool;
use tracing::debug;

use fleetline_core::catalog::{build_catalog, VehicleCatalog, VehiclePrice};
use fleetline_core::types::normalize_part;

use crate::error::DbResult;

const SELECT_COLUMNS: &str = "SELECT id, model, variant, color_list, ex_showroom, life_tax, \
     insurance, on_road_price, accessories, extended_warranty, handling_charges, \
     registration_charges, final_price FROM vehicle_prices";

/// Repository for the vehicle catalog.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Every price row, ordered by model then variant.
    pub async fn list(&self) -> DbResult<Vec<VehiclePrice>> {
        let rows = sqlx::query_as(&format!("{SELECT_COLUMNS} ORDER BY model, variant"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// model → variant → colors tree.
    pub async fn catalog(&self) -> DbResult<VehicleCatalog> {
        Ok(build_catalog(&self.list().await?))
    }

    /// Price row for one model and variant (case-insensitive).
    pub async fn price(&self, model: &str, variant: &str) -> DbResult<Option<VehiclePrice>> {
        let row = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE UPPER(model) = ?1 AND UPPER(variant) = ?2"
        ))
        .bind(normalize_part(model))
        .bind(normalize_part(variant))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Inserts or replaces the price row for `(model, variant)`.
    ///
    /// ## Returns
    /// The row id.
    pub async fn upsert(&self, price: &VehiclePrice) -> DbResult<i64> {
        debug!(model = %price.model, variant = %price.variant, "Upserting price row");

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO vehicle_prices (\
                model, variant, color_list, ex_showroom, life_tax, insurance, on_road_price, \
                accessories, extended_warranty, handling_charges, registration_charges, final_price\
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12) \
             ON CONFLICT (model, variant) DO UPDATE SET \
                color_list = excluded.color_list, \
                ex_showroom = excluded.ex_showroom, \
                life_tax = excluded.life_tax, \
                insurance = excluded.insurance, \
                on_road_price = excluded.on_road_price, \
                accessories = excluded.accessories, \
                extended_warranty = excluded.extended_warranty, \
                handling_charges = excluded.handling_charges, \
                registration_charges = excluded.registration_charges, \
                final_price = excluded.final_price \
             RETURNING id",
        )
        .bind(normalize_part(&price.model))
        .bind(normalize_part(&price.variant))
        .bind(&price.color_list)
        .bind(price.ex_showroom)
        .bind(price.life_tax)
        .bind(price.insurance)
        .bind(price.on_road_price)
        .bind(price.accessories)
        .bind(price.extended_warranty)
        .bind(price.handling_charges)
        .bind(price.registration_charges)
        .bind(price.final_price)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }
}
