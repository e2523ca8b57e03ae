//! # Fleetline Ops
//!
//! Operations surface over the Fleetline ledger: configuration, sessions,
//! role desks and the query/command functions a UI calls.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lib.rs ─────► tracing, database path, startup                          │
//! │  config.rs ──► OpsConfig (defaults → TOML → FLEETLINE_* env)            │
//! │  error.rs ───► ApiError { code, message }                               │
//! │  state/ ─────► DbState, MasterDataCache, SessionState + desks           │
//! │  commands/ ──► stock_snapshot, submit_transfer, assign_pdi, ...         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing
//! 2. Load [`OpsConfig`](config::OpsConfig)
//! 3. Resolve the database path (config, else platform data dir)
//! 4. Connect and run migrations
//! 5. Build [`DbState`](state::DbState) and [`MasterDataCache`](state::MasterDataCache)

pub mod commands;
pub mod config;
pub mod error;
pub mod state;

use std::path::PathBuf;

use directories::ProjectDirs;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fleetline_db::{Database, DbConfig, DbError};

use config::{ConfigError, OpsConfig};
use state::{DbState, MasterDataCache};

const DATABASE_FILE_NAME: &str = "fleetline.db";

/// Failures before the first command can run.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("Could not determine app data directory")]
    NoDataDir,

    #[error("Failed to create data directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=fleetline=trace` - Trace for fleetline crates only
/// - Default: `info,fleetline=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fleetline=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// The configured database path, or `fleetline.db` in the platform data
/// directory (created if missing).
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.fleetline.ops/fleetline.db`
/// - **Windows**: `%APPDATA%\fleetline\ops\data\fleetline.db`
/// - **Linux**: `~/.local/share/ops/fleetline.db`
pub fn database_path(config: &OpsConfig) -> Result<PathBuf, StartupError> {
    if let Some(path) = &config.database.path {
        return Ok(path.clone());
    }

    let dirs = ProjectDirs::from("com", "fleetline", "ops").ok_or(StartupError::NoDataDir)?;
    let data_dir = dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;
    Ok(data_dir.join(DATABASE_FILE_NAME))
}

/// Connects to the configured database and builds the shared state.
pub async fn open(config: &OpsConfig) -> Result<(DbState, MasterDataCache), StartupError> {
    let path = database_path(config)?;
    info!(?path, "Database path determined");

    let db = Database::new(
        DbConfig::new(path).max_connections(config.database.max_connections),
    )
    .await?;
    info!("Database connected and migrations applied");

    Ok((
        DbState::new(db, config),
        MasterDataCache::new(config.master_data_ttl()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_path_wins() {
        let mut config = OpsConfig::default();
        config.database.path = Some(PathBuf::from("/srv/fleetline/custom.db"));
        assert_eq!(
            database_path(&config).unwrap(),
            PathBuf::from("/srv/fleetline/custom.db")
        );
    }

    #[tokio::test]
    async fn test_open_file_database() {
        let dir = std::env::temp_dir().join(format!("fleetline-open-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut config = OpsConfig::default();
        config.database.path = Some(dir.join(DATABASE_FILE_NAME));

        let (db, _) = open(&config).await.unwrap();
        assert!(db.inner().health_check().await);
        assert_eq!(db.recent_limit(), 100);
        db.inner().close().await;

        std::fs::remove_dir_all(dir).unwrap();
    }
}
