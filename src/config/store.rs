//! Backing store configuration

use serde::{Deserialize, Serialize};

/// Connection settings for the snapshot/log store (PostgREST + realtime).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Anon or service-role key, sent as `apikey` and bearer token
    pub api_key: String,
    pub snapshot_table: String,
    pub log_table: String,
    pub timeout_seconds: u64,
    /// Subscribe to the realtime insert feed (otherwise snapshots are polled)
    pub realtime: bool,
    /// Delay before re-opening a dropped realtime connection
    pub reconnect_delay_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            snapshot_table: "system_snapshots".to_string(),
            log_table: "agent_logs".to_string(),
            timeout_seconds: 10,
            realtime: true,
            reconnect_delay_seconds: 5,
        }
    }
}
