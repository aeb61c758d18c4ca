//! Queue depth and the high-priority projection.

use crate::snapshot::{PriorityLevel, Queue};
use std::collections::BTreeMap;

/// Tasks waiting across all queues.
pub fn queue_depth(queues: &[Queue]) -> usize {
    queues.iter().map(|q| q.tasks.len()).sum()
}

/// Queues reduced to their critical and high priority tasks. Queues left
/// with no tasks are dropped.
pub fn high_priority_queues(queues: &[Queue]) -> Vec<Queue> {
    queues
        .iter()
        .filter_map(|queue| {
            let tasks: Vec<_> = queue
                .tasks
                .iter()
                .filter(|task| task.priority.level.is_elevated())
                .cloned()
                .collect();
            if tasks.is_empty() {
                None
            } else {
                Some(Queue {
                    name: queue.name.clone(),
                    tasks,
                    updated_at: queue.updated_at.clone(),
                })
            }
        })
        .collect()
}

pub fn critical_task_count(queues: &[Queue]) -> usize {
    queues
        .iter()
        .flat_map(|q| q.tasks.iter())
        .filter(|task| task.priority.level == PriorityLevel::Critical)
        .count()
}

/// Task count per priority level for one queue.
pub fn priority_breakdown(queue: &Queue) -> BTreeMap<PriorityLevel, usize> {
    let mut counts = BTreeMap::new();
    for task in &queue.tasks {
        *counts.entry(task.priority.level).or_insert(0) += 1;
    }
    counts
}

/// Tasks that are blocking another task.
pub fn blocking_task_count(queues: &[Queue]) -> usize {
    queues
        .iter()
        .flat_map(|q| q.tasks.iter())
        .filter(|task| task.priority.blocked_task.is_some())
        .count()
}
