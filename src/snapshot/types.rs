use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::deserialize_timestamp;

/// One consistent, point-in-time view of the monitored system.
///
/// Sub-collections that are missing from the upstream payload decode as empty
/// sequences rather than failing the whole snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    /// Opaque snapshot identifier (e.g., "snapshot-<uuid>")
    #[serde(default)]
    pub id: String,
    /// When the snapshot was produced upstream; the ordering key
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub agents: Vec<Agent>,
    #[serde(default)]
    pub workload: Vec<Workload>,
    #[serde(default)]
    pub queues: Vec<Queue>,
    /// Per-model language model usage
    #[serde(default)]
    pub litellm: Vec<LlmModel>,
}

impl SystemSnapshot {
    /// Decode a snapshot from a raw store row.
    ///
    /// The collector stores rows as `{snapshot_id, timestamp, state: {...}}`,
    /// while older writers put the snapshot columns directly on the row. When a
    /// `state` object is present it is the payload; `id` and `timestamp` are
    /// filled from the row if the payload lacks them.
    pub fn from_row(mut row: Value) -> Result<Self, serde_json::Error> {
        let payload = match row.get_mut("state").map(Value::take) {
            Some(Value::Object(mut state)) => {
                for (row_key, key) in [
                    ("snapshot_id", "id"),
                    ("id", "id"),
                    ("timestamp", "timestamp"),
                ] {
                    if !state.contains_key(key) {
                        if let Some(value) = row.get(row_key) {
                            let value = match value {
                                Value::Number(n) => Value::String(n.to_string()),
                                other => other.clone(),
                            };
                            state.insert(key.to_string(), value);
                        }
                    }
                }
                Value::Object(state)
            }
            _ => row,
        };
        serde_json::from_value(payload)
    }

    /// Whether this snapshot was produced strictly after `other`.
    pub fn is_newer_than(&self, other: &SystemSnapshot) -> bool {
        self.timestamp > other.timestamp
    }
}

/// An agent deployment and the tasks it is currently working on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub max_parallel_invocations: u32,
    #[serde(default)]
    pub deployment_name: String,
    /// Models this agent is allowed to call
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub activity: AgentActivity,
}

impl Agent {
    /// Tasks the agent is currently holding.
    pub fn active_tasks(&self) -> &[Task] {
        &self.activity.active_task_ids
    }

    /// An agent is active while it holds at least one task.
    pub fn is_active(&self) -> bool {
        !self.activity.active_task_ids.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentActivity {
    #[serde(default)]
    pub active_task_ids: Vec<Task>,
    #[serde(default)]
    pub updated_at: String,
}

/// A task held by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub started_on: String,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Running,
    Waiting,
    Completed,
    Failed,
}

/// A Kubernetes deployment backing one or more agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    pub deployment_name: String,
    #[serde(default)]
    pub max_pods: u32,
    #[serde(default)]
    pub live: WorkloadLive,
    #[serde(default)]
    pub pod_max_ram: String,
    #[serde(default)]
    pub pod_max_cpu: String,
    #[serde(default)]
    pub pods: Vec<Pod>,
}

/// Live rollout state of a deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadLive {
    #[serde(default)]
    pub active_pods: u32,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub rolled_out_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pod {
    pub pod_id: String,
    /// CPU usage in cores
    #[serde(default)]
    pub cpu: f64,
    /// Memory usage in MiB
    #[serde(default)]
    pub memory: f64,
    #[serde(default)]
    pub network_in: f64,
    #[serde(default)]
    pub network_out: f64,
    pub status: PodStatus,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restarts: Option<u32>,
}

/// Kubernetes pod phase.
///
/// Phases outside the known set are preserved verbatim in [`PodStatus::Other`]
/// so that aggregate counts can bucket them separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PodStatus {
    Running,
    Pending,
    Failed,
    Succeeded,
    Unknown,
    Other(String),
}

impl From<String> for PodStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Running" => PodStatus::Running,
            "Pending" => PodStatus::Pending,
            "Failed" => PodStatus::Failed,
            "Succeeded" => PodStatus::Succeeded,
            "Unknown" => PodStatus::Unknown,
            _ => PodStatus::Other(raw),
        }
    }
}

impl From<PodStatus> for String {
    fn from(status: PodStatus) -> Self {
        status.as_str().to_string()
    }
}

impl PodStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PodStatus::Running => "Running",
            PodStatus::Pending => "Pending",
            PodStatus::Failed => "Failed",
            PodStatus::Succeeded => "Succeeded",
            PodStatus::Unknown => "Unknown",
            PodStatus::Other(raw) => raw,
        }
    }
}

/// A message queue and the tasks waiting in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Queue {
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<QueueTask>,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueTask {
    pub id: String,
    #[serde(default)]
    pub invoked_by: String,
    pub priority: TaskPriority,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub args: serde_json::Map<String, Value>,
    #[serde(default)]
    pub submitted_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPriority {
    pub level: PriorityLevel,
    /// Task this one is blocking, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiting_since_mins: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    Low,
    #[serde(alias = "medium")]
    Normal,
    High,
    Critical,
}

impl PriorityLevel {
    /// Critical and high priority tasks make up the condensed queue view.
    pub fn is_elevated(self) -> bool {
        matches!(self, PriorityLevel::High | PriorityLevel::Critical)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PriorityLevel::Low => "low",
            PriorityLevel::Normal => "normal",
            PriorityLevel::High => "high",
            PriorityLevel::Critical => "critical",
        }
    }
}

/// Rate-limit and cost figures for one language model behind the LLM proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmModel {
    pub model: String,
    #[serde(default)]
    pub provider: String,
    /// Tokens per minute
    #[serde(default)]
    pub tpm: f64,
    /// Requests per minute
    #[serde(default)]
    pub rpm: f64,
    #[serde(default)]
    pub tpm_max: f64,
    #[serde(default)]
    pub rpm_max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<PaymentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_context: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_context: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_1k_input: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_1k_output: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Prepaid,
    Postpaid,
    Free,
}
