//! Pod statistics, cluster health and per-deployment rollout view.

use crate::snapshot::{Pod, PodStatus, Workload};
use serde::Serialize;

/// Pod counts over the flattened pod list of all workloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PodStats {
    pub total: usize,
    pub running: usize,
    pub failed: usize,
    /// Everything that is neither running nor failed
    pub pending: usize,
    /// Pods whose phase is not a recognised Kubernetes phase (counted in `pending`)
    pub unrecognised: usize,
}

impl PodStats {
    pub fn from_pods<'a>(pods: impl IntoIterator<Item = &'a Pod>) -> Self {
        let mut stats = PodStats::default();
        for pod in pods {
            stats.total += 1;
            match pod.status {
                PodStatus::Running => stats.running += 1,
                PodStatus::Failed => stats.failed += 1,
                PodStatus::Other(_) => stats.unrecognised += 1,
                _ => {}
            }
        }
        stats.pending = stats.total.saturating_sub(stats.running + stats.failed);
        stats
    }
}

pub fn pod_stats(workloads: &[Workload]) -> PodStats {
    PodStats::from_pods(workloads.iter().flat_map(|w| w.pods.iter()))
}

/// Percentage of running pods, rounded; 100 when there are no pods.
pub fn cluster_health(stats: &PodStats) -> u32 {
    if stats.total == 0 {
        return 100;
    }
    (stats.running as f64 / stats.total as f64 * 100.0).round() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RolloutStatus {
    Healthy,
    Inactive,
}

impl RolloutStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RolloutStatus::Healthy => "Healthy",
            RolloutStatus::Inactive => "Inactive",
        }
    }
}

pub fn rollout_status(workload: &Workload) -> RolloutStatus {
    if workload.live.active_pods > 0 {
        RolloutStatus::Healthy
    } else {
        RolloutStatus::Inactive
    }
}

/// One row of the deployment table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentSummary {
    pub deployment_name: String,
    pub image: String,
    pub active_pods: u32,
    pub max_pods: u32,
    pub pods: PodStats,
    pub cpu_cores: f64,
    pub memory_mib: f64,
    pub restarts: u32,
    pub status: RolloutStatus,
}

pub fn deployment_summaries(workloads: &[Workload]) -> Vec<DeploymentSummary> {
    workloads
        .iter()
        .map(|w| DeploymentSummary {
            deployment_name: w.deployment_name.clone(),
            image: w.live.image.clone(),
            active_pods: w.live.active_pods,
            max_pods: w.max_pods,
            pods: PodStats::from_pods(&w.pods),
            cpu_cores: w.pods.iter().map(|p| p.cpu).sum(),
            memory_mib: w.pods.iter().map(|p| p.memory).sum(),
            restarts: w.pods.iter().filter_map(|p| p.restarts).sum(),
            status: rollout_status(w),
        })
        .collect()
}
