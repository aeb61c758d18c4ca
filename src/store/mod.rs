//! Snapshot store access.
//!
//! [`SnapshotStore`] is the narrow data contract with the backing database:
//! latest snapshot, recent logs and a realtime insert feed. [`RestStore`] is
//! the production implementation; tests inject their own.
//!
//! The `fetch_*` functions are the boundary used by the sync engine. They
//! never fail: store errors are logged, counted and turned into "no data".

mod error;
pub mod realtime;
mod rest;
mod subscription;

pub use error::StoreError;
pub use realtime::{RealtimeConfig, RealtimeSubscriber};
pub use rest::RestStore;
pub use subscription::{FeedStatus, SnapshotCallback, SnapshotSink, Subscription};

use crate::snapshot::{LogEntry, SystemSnapshot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Read-only access to snapshots and logs.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Most recent snapshot by timestamp, or `None` when the table is empty.
    async fn latest_snapshot(&self) -> Result<Option<SystemSnapshot>, StoreError>;

    /// Up to `limit` log entries, newest first.
    async fn recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>, StoreError>;

    /// Snapshots with a timestamp at or after `since`, newest first.
    async fn snapshots_since(&self, since: DateTime<Utc>)
        -> Result<Vec<SystemSnapshot>, StoreError>;

    async fn snapshot_by_id(&self, id: &str) -> Result<Option<SystemSnapshot>, StoreError>;

    /// Deliver every newly inserted snapshot to `on_insert` until the returned
    /// subscription is cancelled.
    fn subscribe(&self, on_insert: SnapshotCallback) -> Result<Subscription, StoreError>;
}

/// Fetch the latest snapshot, converting failures into `None`.
///
/// `None` means "unavailable": callers keep whatever they are showing.
pub async fn fetch_latest_snapshot(store: &dyn SnapshotStore) -> Option<SystemSnapshot> {
    match store.latest_snapshot().await {
        Ok(Some(snapshot)) => {
            tracing::debug!(
                snapshot_id = %snapshot.id,
                timestamp = %snapshot.timestamp,
                "Fetched latest snapshot"
            );
            Some(snapshot)
        }
        Ok(None) => {
            tracing::debug!("Snapshot store returned no rows");
            None
        }
        Err(e) => {
            metrics::counter!("oracle_fetch_failures_total", "kind" => e.kind()).increment(1);
            tracing::warn!(error = %e, "Snapshot fetch failed");
            None
        }
    }
}

/// Fetch up to `limit` recent log entries, converting failures into an
/// empty batch.
pub async fn fetch_recent_logs(store: &dyn SnapshotStore, limit: usize) -> Vec<LogEntry> {
    match store.recent_logs(limit).await {
        Ok(entries) => {
            tracing::debug!(count = entries.len(), limit, "Fetched recent logs");
            entries
        }
        Err(e) => {
            metrics::counter!("oracle_fetch_failures_total", "kind" => e.kind()).increment(1);
            tracing::warn!(error = %e, limit, "Log fetch failed");
            Vec::new()
        }
    }
}
