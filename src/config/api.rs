//! Companion API configuration

use serde::{Deserialize, Serialize};

/// Settings for the chat / task / report HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            // chat replies wait on a model round-trip
            timeout_seconds: 30,
        }
    }
}
