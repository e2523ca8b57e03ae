//! # Master Data Cache
//!
//! Branch hierarchy and vehicle catalog, cached process-wide with a TTL.
//!
//! ```text
//! hierarchy(db) ── hit ───────────────────────► Arc<BranchHierarchy>
//!               └─ miss ─► db.branches().hierarchy() ─► insert ─┘
//!
//! any successful write ─► invalidate() ─► next read goes to SQLite
//! ```
//! Concurrent misses for the same entry share one load.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use fleetline_core::{BranchHierarchy, VehicleCatalog};
use fleetline_db::{Database, DbError};

use crate::error::ApiResult;

#[derive(Clone)]
pub struct MasterDataCache {
    hierarchy: Cache<(), Arc<BranchHierarchy>>,
    catalog: Cache<(), Arc<VehicleCatalog>>,
}

impl MasterDataCache {
    pub fn new(ttl: Duration) -> Self {
        MasterDataCache {
            hierarchy: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
            catalog: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    pub async fn hierarchy(&self, db: &Database) -> ApiResult<Arc<BranchHierarchy>> {
        let hierarchy = self
            .hierarchy
            .try_get_with((), async {
                debug!("Loading branch hierarchy");
                Ok::<_, DbError>(Arc::new(db.branches().hierarchy().await?))
            })
            .await?;
        Ok(hierarchy)
    }

    /// model → variant → colors.
    pub async fn catalog(&self, db: &Database) -> ApiResult<Arc<VehicleCatalog>> {
        let catalog = self
            .catalog
            .try_get_with((), async {
                debug!("Loading vehicle catalog");
                Ok::<_, DbError>(Arc::new(db.catalog().catalog().await?))
            })
            .await?;
        Ok(catalog)
    }

    /// Drops every cached entry.
    pub fn invalidate(&self) {
        debug!("Invalidating master data cache");
        self.hierarchy.invalidate_all();
        self.catalog.invalidate_all();
    }
}

impl std::fmt::Debug for MasterDataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterDataCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetline_core::Branch;
    use fleetline_db::DbConfig;

    #[tokio::test]
    async fn test_cached_until_invalidated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.branches().insert(&Branch::new("H1", "Head")).await.unwrap();

        let cache = MasterDataCache::new(Duration::from_secs(3600));
        assert_eq!(cache.hierarchy(&db).await.unwrap().all_branches().len(), 1);

        db.branches().insert(&Branch::new("S1", "Sub")).await.unwrap();
        assert_eq!(cache.hierarchy(&db).await.unwrap().all_branches().len(), 1);

        cache.invalidate();
        assert_eq!(cache.hierarchy(&db).await.unwrap().all_branches().len(), 2);
    }

    #[tokio::test]
    async fn test_catalog_empty_store() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let cache = MasterDataCache::new(Duration::from_secs(60));
        assert!(cache.catalog(&db).await.unwrap().is_empty());
    }
}
