//! Subscription handles for realtime snapshot delivery.

use crate::snapshot::SystemSnapshot;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Callback invoked with every inserted snapshot.
///
/// Runs on the subscriber task, so it must not block. It must not call
/// [`Subscription::unsubscribe`] on its own subscription.
pub type SnapshotCallback = Box<dyn Fn(SystemSnapshot) + Send + Sync + 'static>;

/// Health of the feed behind a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// No connection has joined yet.
    Connecting,
    /// The channel is joined and inserts are flowing.
    Joined,
    /// The last connection attempt failed or dropped; retrying.
    Down,
}

/// Producer side of a subscription, handed to the task that reads the feed.
///
/// Delivery and closing share one lock, so once [`SnapshotSink::close`] has
/// returned no further callback invocation can start.
#[derive(Clone)]
pub struct SnapshotSink {
    callback: Arc<Mutex<Option<SnapshotCallback>>>,
    cancel: CancellationToken,
    status: Arc<watch::Sender<FeedStatus>>,
}

impl SnapshotSink {
    pub fn new(callback: SnapshotCallback) -> Self {
        let (status, _) = watch::channel(FeedStatus::Connecting);
        Self {
            callback: Arc::new(Mutex::new(Some(callback))),
            cancel: CancellationToken::new(),
            status: Arc::new(status),
        }
    }

    /// Report feed health. Watchers only wake on an actual change.
    pub fn set_status(&self, status: FeedStatus) {
        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }

    /// Hand a snapshot to the callback. Returns false once the sink is closed.
    pub fn deliver(&self, snapshot: SystemSnapshot) -> bool {
        let guard = self.lock();
        match guard.as_ref() {
            Some(callback) => {
                callback(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when the subscription is cancelled.
    pub async fn closed(&self) {
        self.cancel.cancelled().await
    }

    fn close(&self) {
        self.lock().take();
        self.cancel.cancel();
    }

    fn lock(&self) -> MutexGuard<'_, Option<SnapshotCallback>> {
        // A panicking callback must not wedge teardown.
        self.callback
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Handle to a running snapshot subscription.
///
/// Dropping the handle unsubscribes.
pub struct Subscription {
    sink: SnapshotSink,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Spawn `run` as the feed task. The task should return once
    /// [`SnapshotSink::closed`] resolves.
    pub fn spawn<F, Fut>(callback: SnapshotCallback, run: F) -> Self
    where
        F: FnOnce(SnapshotSink) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let sink = SnapshotSink::new(callback);
        let task = tokio::spawn(run(sink.clone()));
        Self {
            sink,
            task: Some(task),
        }
    }

    /// Stop deliveries. Idempotent; after it returns the callback is never
    /// invoked again.
    pub fn unsubscribe(&self) {
        self.sink.close();
    }

    pub fn is_active(&self) -> bool {
        !self.sink.is_closed()
    }

    /// Receiver tracking the feed's [`FeedStatus`].
    pub fn status(&self) -> watch::Receiver<FeedStatus> {
        self.sink.status.subscribe()
    }

    /// Unsubscribe and wait for the feed task to finish.
    pub async fn shutdown(mut self) {
        self.unsubscribe();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Subscription task ended abnormally");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.sink.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    fn snapshot(id: &str) -> SystemSnapshot {
        SystemSnapshot {
            id: id.to_string(),
            timestamp: Utc::now(),
            agents: vec![],
            workload: vec![],
            queues: vec![],
            litellm: vec![],
        }
    }

    #[test]
    fn test_sink_stops_delivering_after_close() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let sink = SnapshotSink::new(Box::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(sink.deliver(snapshot("a")));
        sink.close();
        assert!(!sink.deliver(snapshot("b")));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(sink.is_closed());
    }

    #[tokio::test]
    async fn test_status_follows_sink() {
        let subscription = Subscription::spawn(Box::new(|_: SystemSnapshot| {}), |sink| async move {
            sink.set_status(FeedStatus::Down);
            sink.set_status(FeedStatus::Joined);
            sink.closed().await;
        });
        let mut status = subscription.status();

        status
            .wait_for(|s| *s == FeedStatus::Joined)
            .await
            .unwrap();
        subscription.shutdown().await;
    }

    #[test]
    fn test_unchanged_status_does_not_notify() {
        let sink = SnapshotSink::new(Box::new(|_: SystemSnapshot| {}));
        let mut status = sink.status.subscribe();
        assert_eq!(*status.borrow(), FeedStatus::Connecting);

        sink.set_status(FeedStatus::Connecting);
        assert!(!status.has_changed().unwrap());
        sink.set_status(FeedStatus::Down);
        assert!(status.has_changed().unwrap());
        assert_eq!(*status.borrow_and_update(), FeedStatus::Down);
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent_and_ends_task() {
        let (tx, mut rx) = mpsc::unbounded_channel::<SystemSnapshot>();
        let (feed_tx, mut feed_rx) = mpsc::unbounded_channel::<SystemSnapshot>();

        let subscription = Subscription::spawn(
            Box::new(move |s| {
                let _ = tx.send(s);
            }),
            |sink| async move {
                loop {
                    tokio::select! {
                        _ = sink.closed() => break,
                        Some(s) = feed_rx.recv() => { sink.deliver(s); }
                    }
                }
            },
        );

        feed_tx.send(snapshot("first")).unwrap();
        assert_eq!(rx.recv().await.unwrap().id, "first");

        subscription.unsubscribe();
        subscription.unsubscribe();
        assert!(!subscription.is_active());

        let _ = feed_tx.send(snapshot("late"));
        subscription.shutdown().await;
        assert!(rx.try_recv().is_err());
    }
}
