//! Configuration for JsonKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, StoreError};
use crate::schema::Schema;

/// Main configuration for a JsonKV store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Backing JSON file. Sibling files are derived from it:
    ///   {path}          (store state)
    ///   {path}.log      (transaction log)
    ///   {path}.backup   (auto backup)
    pub path: PathBuf,

    /// Passphrase for encryption at rest. `None` stores plaintext JSON.
    pub encryption_key: Option<String>,

    // -------------------------------------------------------------------------
    // Transaction Log Configuration
    // -------------------------------------------------------------------------
    /// Append a record to `{path}.log` for every mutation
    pub transaction_log: bool,

    // -------------------------------------------------------------------------
    // Cache Configuration
    // -------------------------------------------------------------------------
    /// Max entries held by the FIFO read cache (0 disables caching)
    pub cache_size: usize,

    // -------------------------------------------------------------------------
    // Index Configuration
    // -------------------------------------------------------------------------
    /// Whether mutations re-derive index buckets
    pub index_maintenance: IndexMaintenance,

    // -------------------------------------------------------------------------
    // Backup Configuration
    // -------------------------------------------------------------------------
    /// Interval of the background backup thread; `None` disables it
    pub auto_backup_interval: Option<Duration>,

    // -------------------------------------------------------------------------
    // Validation Configuration
    // -------------------------------------------------------------------------
    /// Per-key validators consulted by `Store::is_valid_data`
    pub schema: Option<Schema>,
}

/// Index maintenance mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexMaintenance {
    /// Indexes only change through explicit add/remove calls.
    /// Buckets go stale when values change under them.
    #[default]
    Manual,

    /// Every mutation re-runs the derive function of each derived index
    /// for the keys it touched
    Strict,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./database.json"),
            encryption_key: None,
            transaction_log: true,
            cache_size: 100,
            index_maintenance: IndexMaintenance::Manual,
            auto_backup_interval: None,
            schema: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Path of the transaction log file
    pub fn log_path(&self) -> PathBuf {
        Self::sibling(&self.path, "log")
    }

    /// Path of the auto backup file
    pub fn backup_path(&self) -> PathBuf {
        Self::sibling(&self.path, "backup")
    }

    /// Check invariants the builder cannot enforce by type
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(StoreError::Config("store path must not be empty".to_string()));
        }
        if let Some(key) = &self.encryption_key {
            if key.is_empty() {
                return Err(StoreError::Config(
                    "encryption key must not be empty".to_string(),
                ));
            }
        }
        if self.auto_backup_interval == Some(Duration::ZERO) {
            return Err(StoreError::Config(
                "auto backup interval must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// "db.json" + "log" -> "db.json.log"
    fn sibling(path: &std::path::Path, suffix: &str) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(".");
        name.push(suffix);
        PathBuf::from(name)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the backing file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Enable encryption at rest with the given passphrase
    pub fn encryption_key(mut self, key: impl Into<String>) -> Self {
        self.config.encryption_key = Some(key.into());
        self
    }

    /// Enable or disable the transaction log
    pub fn transaction_log(mut self, enabled: bool) -> Self {
        self.config.transaction_log = enabled;
        self
    }

    /// Set the FIFO cache bound
    pub fn cache_size(mut self, size: usize) -> Self {
        self.config.cache_size = size;
        self
    }

    /// Set the index maintenance mode
    pub fn index_maintenance(mut self, mode: IndexMaintenance) -> Self {
        self.config.index_maintenance = mode;
        self
    }

    /// Enable periodic backups to `{path}.backup`
    pub fn auto_backup_interval(mut self, interval: Duration) -> Self {
        self.config.auto_backup_interval = Some(interval);
        self
    }

    /// Set the validation schema
    pub fn schema(mut self, schema: Schema) -> Self {
        self.config.schema = Some(schema);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
