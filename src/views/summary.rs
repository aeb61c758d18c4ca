//! The mission-control summary composed from all other views.

use super::{
    active_agent_count, cluster_health, critical_task_count, error_count, high_priority_queues,
    pod_stats, queue_depth, total_active_tasks, unacknowledged, LlmTotals, PodStats,
};
use crate::snapshot::SystemSnapshot;
use crate::sync::SyncState;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Figures that only a snapshot can supply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemFigures {
    pub snapshot_id: String,
    pub snapshot_timestamp: DateTime<Utc>,
    pub total_agents: usize,
    pub active_agents: usize,
    pub active_tasks: usize,
    pub queue_depth: usize,
    pub critical_tasks: usize,
    pub high_priority_queues: usize,
    pub pods: PodStats,
    pub cluster_health: u32,
    pub llm: LlmTotals,
}

impl SystemFigures {
    pub fn from_snapshot(snapshot: &SystemSnapshot) -> Self {
        let pods = pod_stats(&snapshot.workload);
        Self {
            snapshot_id: snapshot.id.clone(),
            snapshot_timestamp: snapshot.timestamp,
            total_agents: snapshot.agents.len(),
            active_agents: active_agent_count(&snapshot.agents),
            active_tasks: total_active_tasks(&snapshot.agents),
            queue_depth: queue_depth(&snapshot.queues),
            critical_tasks: critical_task_count(&snapshot.queues),
            high_priority_queues: high_priority_queues(&snapshot.queues).len(),
            pods,
            cluster_health: cluster_health(&pods),
            llm: LlmTotals::from_models(&snapshot.litellm),
        }
    }
}

/// Headline figures for the whole system.
///
/// Recomputed from scratch on every state change. `system` stays `None`
/// until a snapshot has been received, so an unreachable store never
/// reads as an empty, healthy fleet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub system: Option<SystemFigures>,
    pub log_count: usize,
    pub error_count: usize,
    pub open_alerts: usize,
}

impl Summary {
    /// Figures derived from a snapshot alone; log-derived counts are zero.
    pub fn from_snapshot(snapshot: &SystemSnapshot) -> Self {
        Self {
            system: Some(SystemFigures::from_snapshot(snapshot)),
            log_count: 0,
            error_count: 0,
            open_alerts: 0,
        }
    }

    /// Compose the summary of the synced state.
    pub fn from_state(state: &SyncState) -> Self {
        Self {
            system: state.snapshot().map(SystemFigures::from_snapshot),
            log_count: state.logs().len(),
            error_count: error_count(state.logs()),
            open_alerts: unacknowledged(&state.alerts()).len(),
        }
    }
}
