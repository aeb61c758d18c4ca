//! Configuration module for Oracle Monitor
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`ORACLE_*`, plus `SUPABASE_URL` / `SUPABASE_KEY`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use oracle::config::OracleConfig;
//!
//! let config = OracleConfig::default();
//! assert_eq!(config.sync.max_log_buffer, 200);
//!
//! let toml = r#"
//! [store]
//! url = "https://example.supabase.co"
//! "#;
//! let config: OracleConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.store.url, "https://example.supabase.co");
//! ```

pub mod api;
pub mod error;
pub mod logging;
pub mod store;
pub mod sync;

pub use api::ApiConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use store::StoreConfig;
pub use sync::SyncConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the Oracle Monitor client.
///
/// # Example
///
/// ```rust
/// use oracle::config::OracleConfig;
///
/// let config = OracleConfig::default();
/// assert_eq!(config.store.snapshot_table, "system_snapshots");
/// assert_eq!(config.sync.log_poll_interval_seconds, 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OracleConfig {
    /// Snapshot and log store connection
    pub store: StoreConfig,
    /// Companion chat/task/report API
    pub api: ApiConfig,
    /// Polling and buffer settings
    pub sync: SyncConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl OracleConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse {
                    path: p.to_path_buf(),
                    message: e.to_string(),
                })
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// `ORACLE_*` variables win over the `SUPABASE_*` names used by the
    /// collectors. Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        // Store connection
        if let Some(url) = first_env(&["ORACLE_STORE_URL", "SUPABASE_URL"]) {
            self.store.url = url;
        }
        if let Some(key) = first_env(&[
            "ORACLE_STORE_KEY",
            "SUPABASE_SERVICE_ROLE_KEY",
            "SUPABASE_KEY",
        ]) {
            self.store.api_key = key;
        }
        if let Ok(realtime) = std::env::var("ORACLE_REALTIME") {
            self.store.realtime = realtime.to_lowercase() == "true";
        }

        // Companion API
        if let Ok(url) = std::env::var("ORACLE_API_URL") {
            self.api.base_url = url;
        }

        // Sync
        if let Ok(interval) = std::env::var("ORACLE_LOG_POLL_INTERVAL") {
            if let Ok(i) = interval.parse() {
                self.sync.log_poll_interval_seconds = i;
            }
        }

        // Logging settings
        if let Ok(level) = std::env::var("ORACLE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("ORACLE_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.log_poll_interval_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "sync.log_poll_interval_seconds".to_string(),
                message: "interval must be non-zero".to_string(),
            });
        }
        if self.sync.snapshot_poll_interval_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "sync.snapshot_poll_interval_seconds".to_string(),
                message: "interval must be non-zero".to_string(),
            });
        }

        for (field, value) in [
            ("sync.initial_log_limit", self.sync.initial_log_limit),
            ("sync.poll_log_limit", self.sync.poll_log_limit),
            ("sync.max_log_buffer", self.sync.max_log_buffer),
        ] {
            if value == 0 {
                return Err(ConfigError::Validation {
                    field: field.to_string(),
                    message: "limit must be positive".to_string(),
                });
            }
        }

        if self.store.timeout_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "store.timeout_seconds".to_string(),
                message: "timeout must be non-zero".to_string(),
            });
        }

        self.logging.validate()
    }

    /// Validate that the store connection is configured.
    ///
    /// Only commands that read snapshots or logs need this.
    pub fn require_store(&self) -> Result<(), ConfigError> {
        if self.store.url.trim().is_empty() {
            return Err(ConfigError::MissingStoreSetting {
                setting: "store.url",
                env: "SUPABASE_URL",
            });
        }
        if self.store.api_key.trim().is_empty() {
            return Err(ConfigError::MissingStoreSetting {
                setting: "store.api_key",
                env: "SUPABASE_KEY",
            });
        }
        if !self.store.url.starts_with("http://") && !self.store.url.starts_with("https://") {
            return Err(ConfigError::Validation {
                field: "store.url".to_string(),
                message: "URL must start with http:// or https://".to_string(),
            });
        }
        Ok(())
    }
}

fn first_env(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.is_empty())
}
