//! Derived views over the synced state.
//!
//! Everything here is a pure function of a snapshot and/or the log buffer.
//! Nothing is cached; callers recompute on every change.

mod agents;
mod alerts;
mod diff;
mod infra;
mod llm;
mod logs;
mod queues;
mod summary;

pub use agents::{
    active_agent_count, available_models, filter_agents, total_active_tasks, AgentFilter,
    StatusFilter,
};
pub use alerts::{derive_alerts, unacknowledged, Alert};
pub use diff::{diff_snapshots, CollectionDiff, MetricChange, SnapshotDiff};
pub use infra::{
    cluster_health, deployment_summaries, pod_stats, rollout_status, DeploymentSummary, PodStats,
    RolloutStatus,
};
pub use llm::{
    estimated_daily_cost, is_throttled, model_usage, request_rate, throttled_count, token_rate,
    total_credits, total_daily_cost, utilisation, LlmTotals, ModelUsage, THROTTLE_THRESHOLD,
};
pub use logs::{error_count, filter_logs, LogFilter};
pub use queues::{
    blocking_task_count, critical_task_count, high_priority_queues, priority_breakdown,
    queue_depth,
};
pub use summary::{Summary, SystemFigures};
