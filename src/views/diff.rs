//! Summary-level comparison of two snapshots.

use super::{active_agent_count, pod_stats, queue_depth, token_rate};
use crate::snapshot::SystemSnapshot;
use serde::Serialize;
use std::collections::BTreeMap;

/// Membership changes of one named collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    /// Present in both snapshots with different contents
    pub changed: Vec<String>,
}

impl CollectionDiff {
    fn between<'a, T: PartialEq + 'a>(
        before: impl IntoIterator<Item = (&'a str, &'a T)>,
        after: impl IntoIterator<Item = (&'a str, &'a T)>,
    ) -> Self {
        let before: BTreeMap<&str, &T> = before.into_iter().collect();
        let after: BTreeMap<&str, &T> = after.into_iter().collect();

        let mut diff = CollectionDiff::default();
        for (name, old) in &before {
            match after.get(name) {
                None => diff.removed.push(name.to_string()),
                Some(new) if new != old => diff.changed.push(name.to_string()),
                Some(_) => {}
            }
        }
        for name in after.keys() {
            if !before.contains_key(name) {
                diff.added.push(name.to_string());
            }
        }
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// A headline figure that differs between the two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricChange {
    pub metric: &'static str,
    pub before: f64,
    pub after: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotDiff {
    pub from_id: String,
    pub to_id: String,
    pub agents: CollectionDiff,
    pub deployments: CollectionDiff,
    pub queues: CollectionDiff,
    pub models: CollectionDiff,
    pub metrics: Vec<MetricChange>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
            && self.deployments.is_empty()
            && self.queues.is_empty()
            && self.models.is_empty()
            && self.metrics.is_empty()
    }
}

/// Compare two snapshots, ignoring their id and timestamp.
pub fn diff_snapshots(from: &SystemSnapshot, to: &SystemSnapshot) -> SnapshotDiff {
    let headline = |s: &SystemSnapshot| -> [(&'static str, f64); 5] {
        let pods = pod_stats(&s.workload);
        [
            ("active_agents", active_agent_count(&s.agents) as f64),
            ("queue_depth", queue_depth(&s.queues) as f64),
            ("total_pods", pods.total as f64),
            ("running_pods", pods.running as f64),
            ("token_rate", token_rate(&s.litellm)),
        ]
    };

    let metrics = headline(from)
        .into_iter()
        .zip(headline(to))
        .filter(|((_, before), (_, after))| before != after)
        .map(|((metric, before), (_, after))| MetricChange {
            metric,
            before,
            after,
        })
        .collect();

    SnapshotDiff {
        from_id: from.id.clone(),
        to_id: to.id.clone(),
        agents: CollectionDiff::between(
            from.agents.iter().map(|a| (a.name.as_str(), a)),
            to.agents.iter().map(|a| (a.name.as_str(), a)),
        ),
        deployments: CollectionDiff::between(
            from.workload.iter().map(|w| (w.deployment_name.as_str(), w)),
            to.workload.iter().map(|w| (w.deployment_name.as_str(), w)),
        ),
        queues: CollectionDiff::between(
            from.queues.iter().map(|q| (q.name.as_str(), q)),
            to.queues.iter().map(|q| (q.name.as_str(), q)),
        ),
        models: CollectionDiff::between(
            from.litellm.iter().map(|m| (m.model.as_str(), m)),
            to.litellm.iter().map(|m| (m.model.as_str(), m)),
        ),
        metrics,
    }
}
