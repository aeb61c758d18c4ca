//! Synchronization configuration

use serde::{Deserialize, Serialize};

/// How the client keeps its local view current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between log re-fetches
    pub log_poll_interval_seconds: u64,
    /// Seconds between snapshot re-fetches when realtime is disabled
    pub snapshot_poll_interval_seconds: u64,
    /// Logs requested on the initial fetch
    pub initial_log_limit: usize,
    /// Logs requested on each poll
    pub poll_log_limit: usize,
    /// Maximum number of log entries retained locally
    pub max_log_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            log_poll_interval_seconds: 5,
            snapshot_poll_interval_seconds: 15,
            initial_log_limit: 200,
            poll_log_limit: 50,
            max_log_buffer: 200,
        }
    }
}
