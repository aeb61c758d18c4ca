//! Error types for store operations.

use thiserror::Error;

/// Errors that can occur while talking to the snapshot store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Network connectivity error (DNS, connection refused, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded deadline.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Store returned an error response (4xx, 5xx).
    #[error("Store error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Store response doesn't match the expected row shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Realtime channel failure (connect, join or transport).
    #[error("Realtime error: {0}")]
    Realtime(String),

    /// Client could not be constructed from the configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Short label used for the `kind` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Network(_) => "network",
            StoreError::Timeout(_) => "timeout",
            StoreError::Upstream { .. } => "upstream",
            StoreError::InvalidResponse(_) => "invalid_response",
            StoreError::Realtime(_) => "realtime",
            StoreError::Configuration(_) => "configuration",
        }
    }

    pub(crate) fn from_reqwest(error: reqwest::Error, timeout_ms: u64) -> Self {
        if error.is_timeout() {
            StoreError::Timeout(timeout_ms)
        } else {
            StoreError::Network(error.to_string())
        }
    }
}
