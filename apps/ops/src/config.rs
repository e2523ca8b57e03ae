//! # Operations Configuration
//!
//! ## Configuration Sources (Priority Order)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Environment variables   FLEETLINE_DB_PATH, FLEETLINE_STOCK_POLICY … │
//! │  2. Config file             <config dir>/fleetline.toml or --config     │
//! │  3. Defaults                (this file)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example `fleetline.toml`
//! ```toml
//! [database]
//! path = "/srv/fleetline/fleetline.db"
//! max_connections = 5
//!
//! [ledger]
//! recent_limit = 100
//! stock_policy = "reject_negative"
//!
//! [cache]
//! master_data_ttl_secs = 3600
//!
//! [display]
//! oem_source_label = "HMSI (OEM)"
//! other_source_label = "Other External"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use fleetline_core::{StockPolicy, DEFAULT_RECENT_LIMIT, OEM_SOURCE_LABEL};

const CONFIG_FILE_NAME: &str = "fleetline.toml";

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Platform data dir when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Row cap for undated recent-transaction queries.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: u32,

    #[serde(default)]
    pub stock_policy: StockPolicy,
}

fn default_recent_limit() -> u32 {
    DEFAULT_RECENT_LIMIT
}

impl Default for LedgerSettings {
    fn default() -> Self {
        LedgerSettings {
            recent_limit: default_recent_limit(),
            stock_policy: StockPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_master_data_ttl")]
    pub master_data_ttl_secs: u64,
}

fn default_master_data_ttl() -> u64 {
    3600
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            master_data_ttl_secs: default_master_data_ttl(),
        }
    }
}

/// Labels offered as non-branch inward sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default = "default_oem_label")]
    pub oem_source_label: String,

    #[serde(default = "default_other_label")]
    pub other_source_label: String,
}

fn default_oem_label() -> String {
    OEM_SOURCE_LABEL.to_string()
}

fn default_other_label() -> String {
    "Other External".to_string()
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings {
            oem_source_label: default_oem_label(),
            other_source_label: default_other_label(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpsConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub ledger: LedgerSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub display: DisplaySettings,
}

impl OpsConfig {
    /// Loads defaults, then the TOML file, then `FLEETLINE_*` overrides,
    /// then validates.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be greater than 0".into(),
            ));
        }
        if self.ledger.recent_limit == 0 {
            return Err(ConfigError::Invalid(
                "recent_limit must be greater than 0".into(),
            ));
        }
        if self.cache.master_data_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "master_data_ttl_secs must be greater than 0".into(),
            ));
        }
        if self.display.oem_source_label.trim().is_empty()
            || self.display.other_source_label.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "source labels must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Writes the TOML form, creating the parent directory.
    pub fn save(&self, path: &std::path::Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        info!(?path, "Config saved");
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("FLEETLINE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Ok(max) = std::env::var("FLEETLINE_MAX_CONNECTIONS") {
            if let Ok(m) = max.parse::<u32>() {
                self.database.max_connections = m;
            }
        }

        if let Ok(limit) = std::env::var("FLEETLINE_RECENT_LIMIT") {
            if let Ok(l) = limit.parse::<u32>() {
                self.ledger.recent_limit = l;
            }
        }

        if let Ok(policy) = std::env::var("FLEETLINE_STOCK_POLICY") {
            match policy.to_lowercase().as_str() {
                "allow_negative" => self.ledger.stock_policy = StockPolicy::AllowNegative,
                "reject_negative" => self.ledger.stock_policy = StockPolicy::RejectNegative,
                _ => warn!(policy = %policy, "Unknown stock policy in environment"),
            }
        }

        if let Ok(ttl) = std::env::var("FLEETLINE_CACHE_TTL_SECS") {
            if let Ok(t) = ttl.parse::<u64>() {
                self.cache.master_data_ttl_secs = t;
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "fleetline", "ops")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn master_data_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.master_data_ttl_secs)
    }

    pub fn stock_policy(&self) -> StockPolicy {
        self.ledger.stock_policy
    }
}
