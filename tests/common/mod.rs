//! Shared test utilities for Oracle Monitor integration tests.
//!
//! Provides snapshot and log builders plus an in-memory [`FakeStore`] so the
//! sync engine can be driven without a database.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use oracle::snapshot::{
    Agent, AgentActivity, LlmModel, LogEntry, LogLevel, Pod, PodStatus, PriorityLevel, Queue,
    QueueTask, SystemSnapshot, Task, TaskPriority, TaskStatus, Workload, WorkloadLive,
};
use oracle::store::{
    FeedStatus, SnapshotCallback, SnapshotSink, SnapshotStore, StoreError, Subscription,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

// =============================================================================
// Time
// =============================================================================

/// Fixed reference instant so expected orderings are easy to read.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap()
}

pub fn at(seconds: i64) -> DateTime<Utc> {
    base_time() + Duration::seconds(seconds)
}

// =============================================================================
// Builders
// =============================================================================

pub fn make_log(id: &str, seconds: i64, level: LogLevel) -> LogEntry {
    LogEntry {
        id: id.to_string(),
        timestamp: at(seconds),
        level,
        message: format!("message {}", id),
        source: "worker".to_string(),
    }
}

pub fn make_agent(name: &str, running: usize) -> Agent {
    Agent {
        name: name.to_string(),
        description: format!("{} agent", name),
        max_parallel_invocations: 4,
        deployment_name: name.to_string(),
        models: vec!["gpt-4o".to_string()],
        activity: AgentActivity {
            active_task_ids: (0..running)
                .map(|i| Task {
                    id: format!("{}-task-{}", name, i),
                    started_on: "2025-01-15T09:59:00Z".to_string(),
                    status: TaskStatus::Running,
                })
                .collect(),
            updated_at: String::new(),
        },
    }
}

pub fn make_pod(id: &str, status: PodStatus) -> Pod {
    Pod {
        pod_id: id.to_string(),
        cpu: 0.25,
        memory: 512.0,
        network_in: 1.0,
        network_out: 2.0,
        status,
        updated_at: String::new(),
        restarts: None,
    }
}

pub fn make_workload(name: &str, pods: Vec<Pod>) -> Workload {
    Workload {
        deployment_name: name.to_string(),
        max_pods: 3,
        live: WorkloadLive {
            active_pods: pods.len() as u32,
            updated_at: String::new(),
            image: format!("registry/{}:latest", name),
            rolled_out_at: String::new(),
        },
        pod_max_ram: "1Gi".to_string(),
        pod_max_cpu: "500m".to_string(),
        pods,
    }
}

pub fn make_queue(name: &str, levels: &[PriorityLevel]) -> Queue {
    Queue {
        name: name.to_string(),
        tasks: levels
            .iter()
            .enumerate()
            .map(|(i, level)| QueueTask {
                id: format!("{}-{}", name, i),
                invoked_by: "scheduler".to_string(),
                priority: TaskPriority {
                    level: *level,
                    blocked_task: None,
                    waiting_since_mins: None,
                },
                prompt: format!("prompt {}", i),
                args: serde_json::Map::new(),
                submitted_at: String::new(),
            })
            .collect(),
        updated_at: String::new(),
    }
}

pub fn make_model(name: &str, tpm: f64, rpm: f64, rpm_max: f64) -> LlmModel {
    LlmModel {
        model: name.to_string(),
        provider: "openai".to_string(),
        tpm,
        rpm,
        tpm_max: 100_000.0,
        rpm_max,
        credits: Some(100.0),
        payment_type: None,
        input_context: None,
        output_context: None,
        cost_per_1k_input: Some(0.01),
        cost_per_1k_output: Some(0.03),
    }
}

/// Snapshot with one agent, one running pod and one queue.
pub fn make_snapshot(id: &str, seconds: i64) -> SystemSnapshot {
    SystemSnapshot {
        id: id.to_string(),
        timestamp: at(seconds),
        agents: vec![make_agent("research", 1)],
        workload: vec![make_workload(
            "research",
            vec![make_pod("research-0", PodStatus::Running)],
        )],
        queues: vec![make_queue(
            "default",
            &[PriorityLevel::High, PriorityLevel::Low],
        )],
        litellm: vec![make_model("gpt-4o", 1_000.0, 10.0, 100.0)],
    }
}

/// Store row in the `{snapshot_id, timestamp, state}` layout.
pub fn snapshot_row(snapshot: &SystemSnapshot) -> serde_json::Value {
    let mut state = serde_json::to_value(snapshot).unwrap();
    if let Some(object) = state.as_object_mut() {
        object.remove("id");
    }
    serde_json::json!({
        "snapshot_id": snapshot.id,
        "timestamp": snapshot.timestamp.to_rfc3339(),
        "state": state,
    })
}

// =============================================================================
// FakeStore
// =============================================================================

/// In-memory [`SnapshotStore`].
///
/// Realtime inserts are pushed through the sender returned by
/// [`FakeStore::new`].
pub struct FakeStore {
    snapshot: Mutex<Option<SystemSnapshot>>,
    logs: Mutex<Vec<LogEntry>>,
    inserts: Mutex<Option<mpsc::UnboundedReceiver<SystemSnapshot>>>,
    live: Mutex<Option<SnapshotSink>>,
    racing_insert: Mutex<Option<SystemSnapshot>>,
    fail_reads: AtomicBool,
    fail_subscribe: AtomicBool,
    pub latest_calls: AtomicUsize,
    pub log_calls: AtomicUsize,
}

impl FakeStore {
    pub fn new() -> (Self, mpsc::UnboundedSender<SystemSnapshot>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let store = Self {
            snapshot: Mutex::new(None),
            logs: Mutex::new(Vec::new()),
            inserts: Mutex::new(Some(rx)),
            live: Mutex::new(None),
            racing_insert: Mutex::new(None),
            fail_reads: AtomicBool::new(false),
            fail_subscribe: AtomicBool::new(false),
            latest_calls: AtomicUsize::new(0),
            log_calls: AtomicUsize::new(0),
        };
        (store, tx)
    }

    pub fn set_snapshot(&self, snapshot: SystemSnapshot) {
        *self.snapshot.lock().unwrap() = Some(snapshot);
    }

    /// Replace the log table. Entries are returned newest first.
    pub fn set_logs(&self, mut logs: Vec<LogEntry>) {
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        *self.logs.lock().unwrap() = logs;
    }

    pub fn push_log(&self, entry: LogEntry) {
        let mut logs = self.logs.lock().unwrap().clone();
        logs.push(entry);
        self.set_logs(logs);
    }

    /// Insert `snapshot` while the next `latest_snapshot` read is in flight.
    /// Like a real feed, the insert is lost if nobody is subscribed yet.
    pub fn insert_during_fetch(&self, snapshot: SystemSnapshot) {
        *self.racing_insert.lock().unwrap() = Some(snapshot);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Upstream {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for FakeStore {
    async fn latest_snapshot(&self) -> Result<Option<SystemSnapshot>, StoreError> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(snapshot) = self.racing_insert.lock().unwrap().take() {
            if let Some(sink) = self.live.lock().unwrap().as_ref() {
                sink.deliver(snapshot);
            }
        }
        self.check_reads()?;
        Ok(self.snapshot.lock().unwrap().clone())
    }

    async fn recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>, StoreError> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reads()?;
        Ok(self.logs.lock().unwrap().iter().take(limit).cloned().collect())
    }

    async fn snapshots_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<SystemSnapshot>, StoreError> {
        self.check_reads()?;
        Ok(self
            .snapshot
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.timestamp >= since)
            .cloned()
            .collect())
    }

    async fn snapshot_by_id(&self, id: &str) -> Result<Option<SystemSnapshot>, StoreError> {
        self.check_reads()?;
        Ok(self.snapshot.lock().unwrap().clone().filter(|s| s.id == id))
    }

    fn subscribe(&self, on_insert: SnapshotCallback) -> Result<Subscription, StoreError> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(StoreError::Realtime("connection refused".to_string()));
        }
        let inserts = self
            .inserts
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| StoreError::Realtime("already subscribed".to_string()))?;

        Ok(Subscription::spawn(on_insert, |sink| {
            *self.live.lock().unwrap() = Some(sink.clone());
            feed(sink, inserts)
        }))
    }
}

async fn feed(sink: SnapshotSink, mut inserts: mpsc::UnboundedReceiver<SystemSnapshot>) {
    sink.set_status(FeedStatus::Joined);
    loop {
        tokio::select! {
            _ = sink.closed() => break,
            next = inserts.recv() => match next {
                Some(snapshot) => {
                    sink.deliver(snapshot);
                }
                None => break,
            },
        }
    }
}
