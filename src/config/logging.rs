//! Logging configuration

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

/// Modules that accept their own level under `[logging.component_levels]`.
pub const COMPONENTS: &[&str] = &["api", "cli", "config", "snapshot", "store", "sync", "views"];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Compact lines on stderr
    #[default]
    Pretty,
    /// One JSON object per event, for log shippers
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// `[logging]` section.
///
/// Diagnostics stay at `warn` by default so the live view is not drowned
/// out; raise a single component when chasing a problem:
///
/// ```toml
/// [logging]
/// level = "warn"
///
/// [logging.component_levels]
/// sync = "debug"
/// "store::realtime" = "trace"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// Per-module levels, keyed by module path below the crate root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_levels: Option<HashMap<String, String>>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            component_levels: None,
        }
    }
}

impl LoggingConfig {
    /// Reject levels tracing would not understand and components that do
    /// not exist, instead of silently logging nothing for them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_level("logging.level", &self.level)?;

        for (component, level) in self.component_levels.iter().flatten() {
            let field = format!("logging.component_levels.{}", component);
            let root = component.split("::").next().unwrap_or_default();
            if !COMPONENTS.contains(&root) {
                return Err(ConfigError::Validation {
                    field,
                    message: format!("unknown component (expected one of {})", COMPONENTS.join(", ")),
                });
            }
            parse_level(&field, level)?;
        }

        Ok(())
    }
}

fn parse_level(field: &str, level: &str) -> Result<LevelFilter, ConfigError> {
    level.parse().map_err(|_| ConfigError::Validation {
        field: field.to_string(),
        message: format!("'{}' is not a log level (trace, debug, info, warn, error, off)", level),
    })
}
