//! Interval-driven re-fetching.
//!
//! The log poller approximates a live tail; the snapshot poller stands in for
//! the realtime feed when it is disabled or unavailable.

use super::Update;
use crate::store::{fetch_latest_snapshot, fetch_recent_logs, SnapshotStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// What a [`Poller`] fetches on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTarget {
    /// The latest snapshot.
    Snapshot,
    /// Up to `limit` recent log entries.
    Logs { limit: usize },
}

impl PollTarget {
    fn name(self) -> &'static str {
        match self {
            PollTarget::Snapshot => "snapshot",
            PollTarget::Logs { .. } => "logs",
        }
    }
}

/// Background task that re-fetches from the store on a fixed interval and
/// forwards results to the sync engine.
pub struct Poller {
    store: Arc<dyn SnapshotStore>,
    target: PollTarget,
    interval: Duration,
    updates: mpsc::Sender<Update>,
}

impl Poller {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        target: PollTarget,
        interval: Duration,
        updates: mpsc::Sender<Update>,
    ) -> Self {
        Self {
            store,
            target,
            interval,
            updates,
        }
    }

    pub fn logs(
        store: Arc<dyn SnapshotStore>,
        limit: usize,
        interval: Duration,
        updates: mpsc::Sender<Update>,
    ) -> Self {
        Self::new(store, PollTarget::Logs { limit }, interval, updates)
    }

    pub fn snapshots(
        store: Arc<dyn SnapshotStore>,
        interval: Duration,
        updates: mpsc::Sender<Update>,
    ) -> Self {
        Self::new(store, PollTarget::Snapshot, interval, updates)
    }

    /// Perform one fetch. `None` when there is nothing to forward.
    pub async fn poll_once(&self) -> Option<Update> {
        match self.target {
            PollTarget::Snapshot => fetch_latest_snapshot(self.store.as_ref())
                .await
                .map(Update::Snapshot),
            PollTarget::Logs { limit } => {
                let batch = fetch_recent_logs(self.store.as_ref(), limit).await;
                if batch.is_empty() {
                    None
                } else {
                    Some(Update::LogBatch(batch))
                }
            }
        }
    }

    /// Start the polling loop.
    ///
    /// The first fetch happens one interval after start; the engine performs
    /// the initial fetch itself. The loop exits when `cancel_token` fires or
    /// the engine stops receiving.
    pub fn start(self, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + self.interval;
            let mut interval = tokio::time::interval_at(start, self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            tracing::debug!(
                target_kind = self.target.name(),
                interval_seconds = self.interval.as_secs(),
                "Poller started"
            );

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    _ = interval.tick() => {
                        let update = tokio::select! {
                            _ = cancel_token.cancelled() => break,
                            update = self.poll_once() => update,
                        };
                        if let Some(update) = update {
                            let sent = tokio::select! {
                                _ = cancel_token.cancelled() => break,
                                sent = self.updates.send(update) => sent,
                            };
                            if sent.is_err() {
                                break;
                            }
                        }
                    }
                }
            }

            tracing::debug!(target_kind = self.target.name(), "Poller stopped");
        })
    }
}
