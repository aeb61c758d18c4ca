//! Error types for companion API calls.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Network connectivity error (DNS, connection refused, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded deadline.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// API returned an error response (4xx, 5xx).
    #[error("API error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Response body doesn't match the expected format.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Writing a downloaded report failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ApiError {
    pub(crate) fn from_reqwest(error: reqwest::Error, timeout_ms: u64) -> Self {
        if error.is_timeout() {
            ApiError::Timeout(timeout_ms)
        } else {
            ApiError::Network(error.to_string())
        }
    }
}
