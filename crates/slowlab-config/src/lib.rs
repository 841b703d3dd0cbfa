//! Configuration management for slowlab
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. CLI arguments (highest precedence, applied by the binary)
//! 2. Environment variables (`SLOWLAB_<SECTION>__<KEY>`)
//! 3. slowlab.local.toml (gitignored, local overrides)
//! 4. slowlab.toml (git-tracked, project config)
//! 5. ~/.config/slowlab/config.toml (user defaults)
//! 6. Built-in defaults (lowest precedence)

use serde::{Deserialize, Serialize};
use std::path::Path;

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::{ConfigLoader, ENV_PREFIX};
pub use paths::{LOCAL_CONFIG_FILE, PROJECT_CONFIG_FILE, Paths};

/// Database name that opens a transient in-memory store.
pub const IN_MEMORY_DATABASE: &str = ":memory:";

/// Batch size used when `seed.batch_size` is zero.
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

/// Main slowlab configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub store: StoreConfig,
    pub seed: SeedSettings,
    pub run: RunSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file, or `:memory:`.
    pub database: String,
    pub threads: u32,
    /// Engine memory cap, e.g. `2GB`. Empty leaves the engine default.
    pub memory_limit: String,
    /// Extra engine settings as `key=value` pairs joined by `&`.
    pub params: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: "slowlab.duckdb".to_string(),
            threads: 4,
            memory_limit: "2GB".to_string(),
            params: String::new(),
        }
    }
}

impl StoreConfig {
    pub fn is_in_memory(&self) -> bool {
        self.database == IN_MEMORY_DATABASE
    }

    /// Returns every engine setting to apply at open time, in order:
    /// `threads`, `memory_limit`, then `params`.
    pub fn settings(&self) -> Result<Vec<(String, String)>, ConfigError> {
        let mut settings = vec![("threads".to_string(), self.threads.to_string())];
        if !self.memory_limit.is_empty() {
            settings.push(("memory_limit".to_string(), self.memory_limit.clone()));
        }
        settings.extend(parse_params(&self.params)?);
        Ok(settings)
    }
}

/// Parses `key=value&key=value`. Empty segments are skipped.
pub fn parse_params(params: &str) -> Result<Vec<(String, String)>, ConfigError> {
    params
        .split('&')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(ConfigError::InvalidParam {
                segment: segment.to_string(),
            }),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedSettings {
    /// General population target.
    pub orders: u64,
    pub batch_size: usize,
    pub seed: u64,
    /// Rows owned by the hot customer.
    pub hot_customer: u64,
    /// Rows sharing the hot phone number.
    pub hot_phone: u64,
    /// Rows created on 2024-01-01.
    pub date_range: u64,
}

impl Default for SeedSettings {
    fn default() -> Self {
        Self {
            orders: 1_000_000,
            batch_size: DEFAULT_BATCH_SIZE,
            seed: 42,
            hot_customer: 1_000_000,
            hot_phone: 2_000,
            date_range: 2_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Capture a query plan after each scenario.
    pub explain: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self { explain: true }
    }
}

impl LabConfig {
    /// Resolve a relative database path against `base_dir`
    pub fn resolve_paths(&mut self, base_dir: impl AsRef<Path>) {
        if self.store.is_in_memory() {
            return;
        }
        let database = Path::new(&self.store.database);
        if database.is_relative() {
            self.store.database = base_dir.as_ref().join(database).to_string_lossy().into_owned();
        }
    }

    /// Replaces a zero batch size with [`DEFAULT_BATCH_SIZE`]. Applied to
    /// file, environment and flag values alike.
    pub fn normalize(&mut self) {
        if self.seed.batch_size == 0 {
            self.seed.batch_size = DEFAULT_BATCH_SIZE;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.database.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "store.database must not be empty".to_string(),
            ));
        }
        if self.store.threads == 0 {
            return Err(ConfigError::ValidationError(
                "store.threads must be at least 1".to_string(),
            ));
        }
        self.store.settings().map(|_| ())
    }

    /// Renders the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
