//! Views over the latest snapshot: `agents`, `infra`, `queues`, `llm`

use super::output::{
    format_agents_table, format_deployments_table, format_json, format_llm_totals,
    format_models_table, format_pod_stats, format_pods_table, format_queue_tasks_table,
    format_queues_table,
};
use super::{require_latest, AgentsArgs, CliResult, JsonArgs, QueuesArgs};
use crate::store::SnapshotStore;
use crate::views::{
    active_agent_count, cluster_health, critical_task_count, deployment_summaries, filter_agents,
    high_priority_queues, model_usage, pod_stats, queue_depth, AgentFilter, LlmTotals,
};
use serde_json::json;

/// Handle `oracle agents`
pub async fn handle_agents(args: &AgentsArgs, store: &dyn SnapshotStore) -> CliResult<String> {
    let snapshot = require_latest(store).await?;
    let filter = AgentFilter {
        search: args.search.clone().unwrap_or_default(),
        status: args.status,
        model: args.model.clone(),
    };
    let agents = filter_agents(&snapshot.agents, &filter);

    if args.json {
        return Ok(format_json(&json!({
            "total": snapshot.agents.len(),
            "active": active_agent_count(&snapshot.agents),
            "agents": agents,
        }))?);
    }

    Ok(format!(
        "{}\n{} of {} agents shown, {} active",
        format_agents_table(&agents),
        agents.len(),
        snapshot.agents.len(),
        active_agent_count(&snapshot.agents)
    ))
}

/// Handle `oracle infra`
pub async fn handle_infra(args: &JsonArgs, store: &dyn SnapshotStore) -> CliResult<String> {
    let snapshot = require_latest(store).await?;
    let stats = pod_stats(&snapshot.workload);
    let health = cluster_health(&stats);
    let deployments = deployment_summaries(&snapshot.workload);

    if args.json {
        return Ok(format_json(&json!({
            "pods": stats,
            "cluster_health": health,
            "deployments": deployments,
        }))?);
    }

    Ok(format!(
        "Cluster health: {}%  Pods: {}\n{}\n{}",
        health,
        format_pod_stats(&stats),
        format_deployments_table(&deployments),
        format_pods_table(&snapshot.workload)
    ))
}

/// Handle `oracle queues`
pub async fn handle_queues(args: &QueuesArgs, store: &dyn SnapshotStore) -> CliResult<String> {
    let snapshot = require_latest(store).await?;

    if args.priority {
        let elevated = high_priority_queues(&snapshot.queues);
        if args.json {
            return Ok(format_json(&json!({ "queues": elevated }))?);
        }
        if elevated.is_empty() {
            return Ok("No critical or high priority tasks".to_string());
        }
        return Ok(format_queue_tasks_table(&elevated));
    }

    if args.json {
        return Ok(format_json(&json!({
            "total_tasks": queue_depth(&snapshot.queues),
            "critical_tasks": critical_task_count(&snapshot.queues),
            "queues": snapshot.queues,
        }))?);
    }

    Ok(format!(
        "{}\n{} queued tasks, {} critical",
        format_queues_table(&snapshot.queues),
        queue_depth(&snapshot.queues),
        critical_task_count(&snapshot.queues)
    ))
}

/// Handle `oracle llm`
pub async fn handle_llm(args: &JsonArgs, store: &dyn SnapshotStore) -> CliResult<String> {
    let snapshot = require_latest(store).await?;
    let totals = LlmTotals::from_models(&snapshot.litellm);
    let usage = model_usage(&snapshot.litellm);

    if args.json {
        return Ok(format_json(&json!({
            "totals": totals,
            "models": usage,
        }))?);
    }

    Ok(format!(
        "{}\n{}",
        format_llm_totals(&totals),
        format_models_table(&usage)
    ))
}
