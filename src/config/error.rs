//! Errors raised while loading `oracle.toml`

use std::path::PathBuf;
use thiserror::Error;

/// Why the client configuration could not be loaded or is unusable.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("no config file at {}; create one with `oracle config init`", .0.display())]
    NotFound(PathBuf),

    #[error("{} is not valid TOML: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// The snapshot store cannot be reached without this setting.
    #[error("store is not configured: {setting} is empty (set it in oracle.toml or export {env})")]
    MissingStoreSetting {
        setting: &'static str,
        env: &'static str,
    },
}
