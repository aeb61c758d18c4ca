//! Single-writer state container for the synced view.

use super::merge::merge_logs_counted;
use crate::snapshot::{LogEntry, SystemSnapshot};
use crate::views::{derive_alerts, Alert};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Result of offering a snapshot to [`SyncState::apply_if_newer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotApply {
    /// The snapshot replaced the current one.
    Applied,
    /// Older than the current snapshot; discarded.
    Stale,
    /// Same snapshot already current (delivered by both fetch and feed).
    Duplicate,
    /// The state was torn down; nothing changes any more.
    Disposed,
}

/// Locally held snapshot, log buffer and alert acknowledgements.
///
/// Owned by exactly one writer (the sync engine). Readers get clones through
/// the engine's watch channel.
#[derive(Debug, Clone)]
pub struct SyncState {
    snapshot: Option<SystemSnapshot>,
    logs: Vec<LogEntry>,
    max_logs: usize,
    acknowledged: HashSet<String>,
    snapshot_received_at: Option<DateTime<Utc>>,
    logs_received_at: Option<DateTime<Utc>>,
    ready: bool,
    disposed: bool,
}

impl SyncState {
    pub fn new(max_logs: usize) -> Self {
        Self {
            snapshot: None,
            logs: Vec::new(),
            max_logs,
            acknowledged: HashSet::new(),
            snapshot_received_at: None,
            logs_received_at: None,
            ready: false,
            disposed: false,
        }
    }

    /// Currently displayed snapshot, if any has been received.
    pub fn snapshot(&self) -> Option<&SystemSnapshot> {
        self.snapshot.as_ref()
    }

    /// Log buffer, newest first.
    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn max_logs(&self) -> usize {
        self.max_logs
    }

    pub fn acknowledged(&self) -> &HashSet<String> {
        &self.acknowledged
    }

    pub fn snapshot_received_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot_received_at
    }

    pub fn logs_received_at(&self) -> Option<DateTime<Utc>> {
        self.logs_received_at
    }

    /// True once the initial fetch has completed.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    /// Replace the current snapshot unless `snapshot` is older than it.
    ///
    /// Ordering is by snapshot timestamp, not by arrival. A snapshot with the
    /// same timestamp but a different id still replaces the current one.
    pub fn apply_if_newer(&mut self, snapshot: SystemSnapshot) -> SnapshotApply {
        if self.disposed {
            return SnapshotApply::Disposed;
        }

        if let Some(current) = &self.snapshot {
            if snapshot.timestamp < current.timestamp {
                return SnapshotApply::Stale;
            }
            if snapshot.timestamp == current.timestamp && snapshot.id == current.id {
                return SnapshotApply::Duplicate;
            }
        }

        self.snapshot = Some(snapshot);
        self.snapshot_received_at = Some(Utc::now());
        SnapshotApply::Applied
    }

    /// Merge a fetched log batch into the buffer. Returns the number of new
    /// entries.
    ///
    /// A failed fetch arrives as an empty batch and leaves both the buffer
    /// and `logs_received_at` untouched. Acknowledgements for entries that
    /// have left the buffer are dropped.
    pub fn apply_logs(&mut self, batch: Vec<LogEntry>) -> usize {
        if self.disposed || batch.is_empty() {
            return 0;
        }

        let (merged, added) = merge_logs_counted(&self.logs, batch, self.max_logs);
        self.logs = merged;
        self.logs_received_at = Some(Utc::now());

        let buffered: HashSet<&str> = self.logs.iter().map(|entry| entry.id.as_str()).collect();
        self.acknowledged.retain(|id| buffered.contains(id.as_str()));
        added
    }

    /// Mark an alert as acknowledged. Local only; returns false if it already was.
    pub fn acknowledge(&mut self, alert_id: &str) -> bool {
        if self.disposed {
            return false;
        }
        self.acknowledged.insert(alert_id.to_string())
    }

    /// Alerts derived from the current log buffer.
    pub fn alerts(&self) -> Vec<Alert> {
        derive_alerts(&self.logs, &self.acknowledged)
    }

    /// Tear down: every later write is a no-op.
    pub fn dispose(&mut self) {
        self.disposed = true;
    }
}
