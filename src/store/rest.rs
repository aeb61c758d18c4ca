//! PostgREST-backed snapshot store.

use super::realtime::{RealtimeConfig, RealtimeSubscriber};
use super::{SnapshotCallback, SnapshotStore, StoreError, Subscription};
use crate::config::StoreConfig;
use crate::snapshot::{LogEntry, SystemSnapshot};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Snapshot store reached over the PostgREST HTTP interface, with inserts
/// pushed over the realtime websocket.
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
    snapshot_table: String,
    log_table: String,
    timeout_ms: u64,
    realtime: RealtimeConfig,
}

impl RestStore {
    /// Create a store client from configuration.
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| StoreError::Configuration(e.to_string()))?;
        Self::with_client(config, client)
    }

    /// Create a store client with a custom HTTP client (for testing).
    pub fn with_client(config: &StoreConfig, client: Client) -> Result<Self, StoreError> {
        let base_url = config.url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(StoreError::Configuration("store URL is empty".to_string()));
        }
        let realtime = RealtimeConfig::from_store(config)?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            snapshot_table: config.snapshot_table.clone(),
            log_table: config.log_table.clone(),
            timeout_ms: config.timeout_seconds * 1000,
            realtime,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Run a PostgREST select and return the raw rows.
    async fn select(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<Value>, StoreError> {
        let response = self
            .client
            .get(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| StoreError::from_reqwest(e, self.timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(|e| {
            StoreError::InvalidResponse(format!("Failed to read response body: {}", e))
        })?;

        serde_json::from_str(&body).map_err(|e| {
            StoreError::InvalidResponse(format!("Expected an array of rows: {}", e))
        })
    }

    async fn select_snapshots(
        &self,
        query: &[(&str, String)],
    ) -> Result<Vec<SystemSnapshot>, StoreError> {
        self.select(&self.snapshot_table, query)
            .await?
            .into_iter()
            .map(|row| {
                SystemSnapshot::from_row(row).map_err(|e| {
                    StoreError::InvalidResponse(format!("Failed to decode snapshot row: {}", e))
                })
            })
            .collect()
    }
}

#[async_trait]
impl SnapshotStore for RestStore {
    async fn latest_snapshot(&self) -> Result<Option<SystemSnapshot>, StoreError> {
        let mut snapshots = self
            .select_snapshots(&[
                ("select", "*".to_string()),
                ("order", "timestamp.desc".to_string()),
                ("limit", "1".to_string()),
            ])
            .await?;
        Ok(if snapshots.is_empty() {
            None
        } else {
            Some(snapshots.swap_remove(0))
        })
    }

    async fn recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>, StoreError> {
        let rows = self
            .select(
                &self.log_table,
                &[
                    ("select", "*".to_string()),
                    ("order", "timestamp.desc".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        let total = rows.len();
        let entries: Vec<LogEntry> = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<LogEntry>(row) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping malformed log row");
                    None
                }
            })
            .collect();

        if entries.len() < total {
            tracing::warn!(
                skipped = total - entries.len(),
                count = total,
                "Dropped malformed log rows"
            );
        }

        Ok(entries)
    }

    async fn snapshots_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<SystemSnapshot>, StoreError> {
        self.select_snapshots(&[
            ("select", "*".to_string()),
            (
                "timestamp",
                format!("gte.{}", since.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ),
            ("order", "timestamp.desc".to_string()),
        ])
        .await
    }

    async fn snapshot_by_id(&self, id: &str) -> Result<Option<SystemSnapshot>, StoreError> {
        let mut snapshots = self
            .select_snapshots(&[
                ("select", "*".to_string()),
                ("snapshot_id", format!("eq.{}", id)),
                ("limit", "1".to_string()),
            ])
            .await?;
        Ok(snapshots.pop())
    }

    fn subscribe(&self, on_insert: SnapshotCallback) -> Result<Subscription, StoreError> {
        Ok(RealtimeSubscriber::new(self.realtime.clone()).subscribe(on_insert))
    }
}
