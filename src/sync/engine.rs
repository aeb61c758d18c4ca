//! The sync engine: sole owner and writer of [`SyncState`].

use super::{Poller, SnapshotApply, SyncCommand, SyncState, Update};
use crate::config::SyncConfig;
use crate::snapshot::SystemSnapshot;
use crate::store::{
    fetch_latest_snapshot, fetch_recent_logs, FeedStatus, SnapshotCallback, SnapshotStore,
    Subscription,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const UPDATE_CHANNEL_CAPACITY: usize = 64;
const COMMAND_CHANNEL_CAPACITY: usize = 16;

/// Keeps a local [`SyncState`] in step with the store.
///
/// Lifecycle:
/// 1. realtime subscription, opened first so no insert is missed,
/// 2. initial fetch of the latest snapshot and recent logs (awaited together),
/// 3. the log poller, plus a snapshot poller whenever the realtime feed is
///    disabled or not joined, all feeding one [`Update`] channel,
/// 4. on cancellation: unsubscribe, stop the pollers, dispose the state.
///
/// Every change is published on a `watch` channel for renderers.
pub struct SyncEngine {
    store: Arc<dyn SnapshotStore>,
    config: SyncConfig,
    realtime: bool,
    state: SyncState,
    publisher: watch::Sender<SyncState>,
    commands_tx: mpsc::Sender<SyncCommand>,
    commands_rx: mpsc::Receiver<SyncCommand>,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn SnapshotStore>, config: SyncConfig, realtime: bool) -> Self {
        let state = SyncState::new(config.max_log_buffer);
        let (publisher, _) = watch::channel(state.clone());
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        Self {
            store,
            config,
            realtime,
            state,
            publisher,
            commands_tx,
            commands_rx,
        }
    }

    /// Receiver that observes every published state.
    pub fn watch(&self) -> watch::Receiver<SyncState> {
        self.publisher.subscribe()
    }

    /// Sender for commands such as alert acknowledgement.
    pub fn commands(&self) -> mpsc::Sender<SyncCommand> {
        self.commands_tx.clone()
    }

    /// Run the engine on a background task.
    pub fn start(self, cancel_token: CancellationToken) -> JoinHandle<SyncState> {
        tokio::spawn(self.run(cancel_token))
    }

    /// Run until `cancel_token` fires, returning the final (disposed) state.
    pub async fn run(mut self, cancel_token: CancellationToken) -> SyncState {
        let (updates_tx, mut updates_rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        let producers = cancel_token.child_token();

        // Subscribed before the initial fetch so inserts landing meanwhile
        // queue up; apply_if_newer sorts out the overlap.
        let subscription = if self.realtime {
            self.subscribe(updates_tx.clone())
        } else {
            None
        };
        let mut feed = subscription.as_ref().map(Subscription::status);
        let mut pollers = Vec::new();
        let mut fallback: Option<SnapshotFallback> = None;

        if self.initial_sync(&cancel_token).await {
            pollers.push(
                Poller::logs(
                    Arc::clone(&self.store),
                    self.config.poll_log_limit,
                    Duration::from_secs(self.config.log_poll_interval_seconds),
                    updates_tx.clone(),
                )
                .start(producers.clone()),
            );

            let joined = feed
                .as_ref()
                .is_some_and(|status| *status.borrow() == FeedStatus::Joined);
            if !joined {
                fallback = Some(self.poll_snapshots(updates_tx.clone(), &producers));
            }

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    update = updates_rx.recv() => match update {
                        Some(update) => {
                            if self.apply(update) {
                                self.publish();
                            }
                        }
                        None => break,
                    },
                    Some(command) = self.commands_rx.recv() => {
                        if self.handle(command) {
                            self.publish();
                        }
                    }
                    status = next_feed_status(&mut feed) => match (status, fallback.take()) {
                        (FeedStatus::Joined, Some(polling)) => {
                            tracing::info!("Realtime feed joined, stopping snapshot polling");
                            polling.stop().await;
                        }
                        (FeedStatus::Joined, None) => {}
                        (_, Some(polling)) => fallback = Some(polling),
                        (_, None) => {
                            tracing::warn!("Realtime feed down, polling snapshots");
                            fallback = Some(self.poll_snapshots(updates_tx.clone(), &producers));
                        }
                    },
                }
            }
        }
        drop(updates_tx);

        // Teardown: stop every producer, then make late results no-ops.
        if let Some(subscription) = &subscription {
            subscription.unsubscribe();
        }
        producers.cancel();
        self.state.dispose();
        updates_rx.close();

        if let Some(polling) = fallback {
            pollers.push(polling.task);
        }
        for result in futures::future::join_all(pollers).await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Poller task ended abnormally");
            }
        }
        if let Some(subscription) = subscription {
            subscription.shutdown().await;
        }

        self.publish();
        tracing::info!("Sync engine stopped");
        self.state
    }

    /// Fetch the latest snapshot and recent logs together, then mark the
    /// state ready. Returns false if cancelled first.
    async fn initial_sync(&mut self, cancel_token: &CancellationToken) -> bool {
        let store = Arc::clone(&self.store);
        let initial_limit = self.config.initial_log_limit;

        let initial = tokio::select! {
            _ = cancel_token.cancelled() => None,
            fetched = async {
                tokio::join!(
                    fetch_latest_snapshot(store.as_ref()),
                    fetch_recent_logs(store.as_ref(), initial_limit),
                )
            } => Some(fetched),
        };

        let Some((snapshot, logs)) = initial else {
            return false;
        };

        if let Some(snapshot) = snapshot {
            self.apply(Update::Snapshot(snapshot));
        }
        self.apply(Update::LogBatch(logs));
        self.state.mark_ready();
        self.publish();
        tracing::info!(
            snapshot = self.state.snapshot().is_some(),
            count = self.state.logs().len(),
            "Initial sync complete"
        );
        true
    }

    fn poll_snapshots(
        &self,
        updates: mpsc::Sender<Update>,
        parent: &CancellationToken,
    ) -> SnapshotFallback {
        let token = parent.child_token();
        let task = Poller::snapshots(
            Arc::clone(&self.store),
            Duration::from_secs(self.config.snapshot_poll_interval_seconds),
            updates,
        )
        .start(token.clone());
        SnapshotFallback { token, task }
    }

    fn subscribe(&self, updates: mpsc::Sender<Update>) -> Option<Subscription> {
        let callback: SnapshotCallback = Box::new(move |snapshot: SystemSnapshot| {
            match updates.try_send(Update::Snapshot(snapshot)) {
                Ok(()) | Err(TrySendError::Closed(_)) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!("Update channel full, dropping realtime snapshot");
                }
            }
        });

        match self.store.subscribe(callback) {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                tracing::warn!(error = %e, "Realtime subscription unavailable, polling snapshots");
                None
            }
        }
    }

    /// Apply one update. Returns true when the visible state changed.
    fn apply(&mut self, update: Update) -> bool {
        match update {
            Update::Snapshot(snapshot) => {
                let snapshot_id = snapshot.id.clone();
                let timestamp = snapshot.timestamp;
                match self.state.apply_if_newer(snapshot) {
                    SnapshotApply::Applied => {
                        metrics::counter!("oracle_snapshots_applied_total").increment(1);
                        tracing::debug!(snapshot_id = %snapshot_id, timestamp = %timestamp, "Snapshot applied");
                        true
                    }
                    SnapshotApply::Stale => {
                        metrics::counter!("oracle_snapshots_stale_total").increment(1);
                        tracing::debug!(snapshot_id = %snapshot_id, timestamp = %timestamp, "Discarded stale snapshot");
                        false
                    }
                    SnapshotApply::Duplicate | SnapshotApply::Disposed => false,
                }
            }
            Update::LogBatch(batch) => {
                let added = self.state.apply_logs(batch);
                metrics::counter!("oracle_logs_merged_total").increment(added as u64);
                metrics::gauge!("oracle_log_buffer_size").set(self.state.logs().len() as f64);
                if added > 0 {
                    tracing::debug!(count = added, "Merged new log entries");
                }
                added > 0
            }
        }
    }

    fn handle(&mut self, command: SyncCommand) -> bool {
        match command {
            SyncCommand::Acknowledge(alert_id) => self.state.acknowledge(&alert_id),
        }
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }
}

/// Snapshot poller standing in for the realtime feed.
struct SnapshotFallback {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl SnapshotFallback {
    async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Snapshot poller ended abnormally");
        }
    }
}

/// Next change of the feed status. Never resolves without a feed; a feed
/// task that has gone away counts as down.
async fn next_feed_status(feed: &mut Option<watch::Receiver<FeedStatus>>) -> FeedStatus {
    let Some(status) = feed.as_mut() else {
        return std::future::pending().await;
    };
    match status.changed().await {
        Ok(()) => *status.borrow_and_update(),
        Err(_) => {
            *feed = None;
            FeedStatus::Down
        }
    }
}
