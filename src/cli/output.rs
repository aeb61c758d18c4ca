//! Output formatting helpers for CLI commands

use crate::snapshot::{
    Agent, LogEntry, LogLevel, PodStatus, PriorityLevel, Queue, SystemSnapshot, Workload,
};
use crate::sync::SyncState;
use crate::views::{
    high_priority_queues, priority_breakdown, unacknowledged, Alert, DeploymentSummary,
    LlmTotals, ModelUsage, PodStats, RolloutStatus, SnapshotDiff, Summary, SystemFigures,
};
use chrono::{DateTime, Utc};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;

const DASHBOARD_ALERTS: usize = 5;
const DASHBOARD_LOGS: usize = 10;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

/// Pretty-printed JSON for `--json` output.
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

fn format_time(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn level_cell(level: LogLevel) -> String {
    match level {
        LogLevel::Error => "error".red().to_string(),
        LogLevel::Warning => "warning".yellow().to_string(),
        LogLevel::Info => "info".to_string(),
        LogLevel::Debug => "debug".dimmed().to_string(),
    }
}

pub fn priority_cell(level: PriorityLevel) -> String {
    match level {
        PriorityLevel::Critical => "critical".red().bold().to_string(),
        PriorityLevel::High => "high".yellow().to_string(),
        PriorityLevel::Normal => "normal".to_string(),
        PriorityLevel::Low => "low".dimmed().to_string(),
    }
}

fn health_cell(health: u32) -> String {
    let text = format!("{}%", health);
    match health {
        90..=u32::MAX => text.green().to_string(),
        70..=89 => text.yellow().to_string(),
        _ => text.red().to_string(),
    }
}

/// Format the headline summary as a two-column table.
///
/// Without a snapshot the system rows read "unavailable" rather than zero.
pub fn format_summary(summary: &Summary) -> String {
    let mut table = new_table(vec!["Metric", "Value"]);

    let mut rows: Vec<(&str, String)> = match &summary.system {
        Some(system) => system_rows(system),
        None => {
            let unavailable = || "unavailable".dimmed().to_string();
            vec![
                ("Snapshot", unavailable()),
                ("Active agents", unavailable()),
                ("Active tasks", unavailable()),
                ("Queue depth", unavailable()),
                ("Cluster health", unavailable()),
                ("Pods", unavailable()),
                ("Token rate", unavailable()),
                ("Throttled models", unavailable()),
                ("Est. daily cost", unavailable()),
            ]
        }
    };
    rows.push((
        "Logs",
        format!("{} ({} errors)", summary.log_count, summary.error_count),
    ));
    rows.push(("Open alerts", summary.open_alerts.to_string()));

    for (metric, value) in rows {
        table.add_row(vec![Cell::new(metric), Cell::new(value)]);
    }

    table.to_string()
}

fn system_rows(system: &SystemFigures) -> Vec<(&'static str, String)> {
    vec![
        (
            "Snapshot",
            format!(
                "{} ({})",
                system.snapshot_id,
                format_time(&system.snapshot_timestamp)
            ),
        ),
        (
            "Active agents",
            format!("{} / {}", system.active_agents, system.total_agents),
        ),
        ("Active tasks", system.active_tasks.to_string()),
        (
            "Queue depth",
            format!("{} ({} critical)", system.queue_depth, system.critical_tasks),
        ),
        ("Cluster health", health_cell(system.cluster_health)),
        ("Pods", format_pod_stats(&system.pods)),
        ("Token rate", format!("{:.0} tpm", system.llm.token_rate)),
        (
            "Throttled models",
            format!("{} / {}", system.llm.throttled, system.llm.models),
        ),
        ("Est. daily cost", format!("${:.2}", system.llm.daily_cost)),
    ]
}

pub fn format_pod_stats(stats: &PodStats) -> String {
    let mut line = format!(
        "{} total, {} running, {} failed, {} pending",
        stats.total,
        stats.running.to_string().green(),
        stats.failed.to_string().red(),
        stats.pending.to_string().yellow()
    );
    if stats.unrecognised > 0 {
        line.push_str(&format!(" ({} unrecognised)", stats.unrecognised));
    }
    line
}

/// Format a list of snapshots, newest first
pub fn format_snapshots_table(snapshots: &[SystemSnapshot]) -> String {
    let mut table = new_table(vec![
        "Snapshot", "Timestamp", "Agents", "Active", "Queued", "Pods", "Health",
    ]);

    for snapshot in snapshots {
        let summary = SystemFigures::from_snapshot(snapshot);
        table.add_row(vec![
            Cell::new(&snapshot.id),
            Cell::new(format_time(&snapshot.timestamp)),
            Cell::new(summary.total_agents),
            Cell::new(summary.active_agents),
            Cell::new(summary.queue_depth),
            Cell::new(summary.pods.total),
            Cell::new(health_cell(summary.cluster_health)),
        ]);
    }

    table.to_string()
}

pub fn format_diff(diff: &SnapshotDiff) -> String {
    if diff.is_empty() {
        return format!("No differences between {} and {}", diff.from_id, diff.to_id);
    }

    let mut table = new_table(vec!["Section", "Added", "Removed", "Changed"]);
    for (section, changes) in [
        ("Agents", &diff.agents),
        ("Deployments", &diff.deployments),
        ("Queues", &diff.queues),
        ("Models", &diff.models),
    ] {
        if changes.is_empty() {
            continue;
        }
        table.add_row(vec![
            Cell::new(section),
            Cell::new(changes.added.join(", ").green().to_string()),
            Cell::new(changes.removed.join(", ").red().to_string()),
            Cell::new(changes.changed.join(", ")),
        ]);
    }

    let mut output = format!("{} -> {}\n{}", diff.from_id, diff.to_id, table);

    if !diff.metrics.is_empty() {
        let mut metrics = new_table(vec!["Metric", "Before", "After"]);
        for change in &diff.metrics {
            metrics.add_row(vec![
                Cell::new(change.metric),
                Cell::new(change.before),
                Cell::new(change.after),
            ]);
        }
        output.push('\n');
        output.push_str(&metrics.to_string());
    }

    output
}

/// Format agents as a table
pub fn format_agents_table(agents: &[&Agent]) -> String {
    let mut table = new_table(vec![
        "Name", "Deployment", "Status", "Tasks", "Max", "Models",
    ]);

    for agent in agents {
        let status = if agent.is_active() {
            "Active".green().to_string()
        } else {
            "Idle".dimmed().to_string()
        };
        table.add_row(vec![
            Cell::new(&agent.name),
            Cell::new(&agent.deployment_name),
            Cell::new(status),
            Cell::new(agent.active_tasks().len()),
            Cell::new(agent.max_parallel_invocations),
            Cell::new(agent.models.join(", ")),
        ]);
    }

    table.to_string()
}

/// Format deployments as a table
pub fn format_deployments_table(rows: &[DeploymentSummary]) -> String {
    let mut table = new_table(vec![
        "Deployment", "Image", "Pods", "Running", "Failed", "CPU", "Memory", "Restarts", "Status",
    ]);

    for row in rows {
        let status = match row.status {
            RolloutStatus::Healthy => row.status.as_str().green().to_string(),
            RolloutStatus::Inactive => row.status.as_str().red().to_string(),
        };
        table.add_row(vec![
            Cell::new(&row.deployment_name),
            Cell::new(&row.image),
            Cell::new(format!("{}/{}", row.active_pods, row.max_pods)),
            Cell::new(row.pods.running),
            Cell::new(row.pods.failed),
            Cell::new(format!("{:.2}", row.cpu_cores)),
            Cell::new(format!("{:.0} MiB", row.memory_mib)),
            Cell::new(row.restarts),
            Cell::new(status),
        ]);
    }

    table.to_string()
}

fn pod_status_cell(status: &PodStatus) -> String {
    match status {
        PodStatus::Running | PodStatus::Succeeded => status.as_str().green().to_string(),
        PodStatus::Failed => status.as_str().red().to_string(),
        _ => status.as_str().yellow().to_string(),
    }
}

/// Format every pod of every deployment, one row per pod
pub fn format_pods_table(workloads: &[Workload]) -> String {
    let mut table = new_table(vec![
        "Deployment", "Pod", "Status", "CPU", "Memory", "Net in", "Net out", "Restarts",
    ]);

    for workload in workloads {
        for pod in &workload.pods {
            table.add_row(vec![
                Cell::new(&workload.deployment_name),
                Cell::new(&pod.pod_id),
                Cell::new(pod_status_cell(&pod.status)),
                Cell::new(format!("{:.2}", pod.cpu)),
                Cell::new(format!("{:.0} MiB", pod.memory)),
                Cell::new(format!("{:.1}", pod.network_in)),
                Cell::new(format!("{:.1}", pod.network_out)),
                Cell::new(pod.restarts.map(|r| r.to_string()).unwrap_or_default()),
            ]);
        }
    }

    table.to_string()
}

/// Format queues with their per-priority task counts
pub fn format_queues_table(queues: &[Queue]) -> String {
    let mut table = new_table(vec!["Queue", "Tasks", "Critical", "High", "Normal", "Low"]);

    for queue in queues {
        let counts = priority_breakdown(queue);
        let count = |level: PriorityLevel| counts.get(&level).copied().unwrap_or(0);
        table.add_row(vec![
            Cell::new(&queue.name),
            Cell::new(queue.tasks.len()),
            Cell::new(count(PriorityLevel::Critical)),
            Cell::new(count(PriorityLevel::High)),
            Cell::new(count(PriorityLevel::Normal)),
            Cell::new(count(PriorityLevel::Low)),
        ]);
    }

    table.to_string()
}

/// Format individual queue tasks, one row per task
pub fn format_queue_tasks_table(queues: &[Queue]) -> String {
    let mut table = new_table(vec!["Queue", "Task", "Priority", "Invoked by", "Waiting", "Blocks"]);

    for queue in queues {
        for task in &queue.tasks {
            table.add_row(vec![
                Cell::new(&queue.name),
                Cell::new(&task.id),
                Cell::new(priority_cell(task.priority.level)),
                Cell::new(&task.invoked_by),
                Cell::new(
                    task.priority
                        .waiting_since_mins
                        .map(|m| format!("{}m", m))
                        .unwrap_or_default(),
                ),
                Cell::new(task.priority.blocked_task.as_deref().unwrap_or("")),
            ]);
        }
    }

    table.to_string()
}

/// Format language models as a table
pub fn format_models_table(models: &[ModelUsage]) -> String {
    let mut table = new_table(vec![
        "Model", "Provider", "TPM", "TPM %", "RPM", "RPM %", "Credits", "Daily cost",
    ]);

    for m in models {
        let rpm_percent = format!("{:.0}%", m.rpm_percent);
        let rpm_percent = if m.throttled {
            rpm_percent.red().to_string()
        } else {
            rpm_percent
        };
        table.add_row(vec![
            Cell::new(&m.model),
            Cell::new(&m.provider),
            Cell::new(format!("{:.0}", m.tpm)),
            Cell::new(format!("{:.0}%", m.tpm_percent)),
            Cell::new(format!("{:.0}", m.rpm)),
            Cell::new(rpm_percent),
            Cell::new(
                m.credits
                    .map(|c| format!("${:.2}", c))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(format!("${:.2}", m.daily_cost)),
        ]);
    }

    table.to_string()
}

pub fn format_llm_totals(totals: &LlmTotals) -> String {
    format!(
        "Token rate: {:.0} tpm | Credits: ${:.2} | Est. daily cost: ${:.2} | Throttled: {}/{}",
        totals.token_rate, totals.total_credits, totals.daily_cost, totals.throttled, totals.models
    )
}

/// Format log entries as a table
pub fn format_logs_table(logs: &[&LogEntry]) -> String {
    let mut table = new_table(vec!["Time", "Level", "Source", "Message"]);

    for entry in logs {
        table.add_row(vec![
            Cell::new(format_time(&entry.timestamp)),
            Cell::new(level_cell(entry.level)),
            Cell::new(&entry.source),
            Cell::new(&entry.message),
        ]);
    }

    table.to_string()
}

/// Format alerts as a table
pub fn format_alerts_table(alerts: &[Alert]) -> String {
    let mut table = new_table(vec!["Id", "Time", "Level", "Source", "Message", "Ack"]);

    for alert in alerts {
        table.add_row(vec![
            Cell::new(&alert.id),
            Cell::new(format_time(&alert.timestamp)),
            Cell::new(level_cell(alert.level)),
            Cell::new(&alert.source),
            Cell::new(&alert.message),
            Cell::new(if alert.acknowledged { "✓" } else { "" }),
        ]);
    }

    table.to_string()
}

/// Render one frame of the live view.
pub fn format_dashboard(state: &SyncState) -> String {
    let summary = Summary::from_state(state);
    let mut output = String::new();

    output.push_str(&format!("{}\n", "Oracle Monitor - Mission Control".bold()));
    output.push_str(&format_summary(&summary));
    output.push('\n');

    if let Some(snapshot) = state.snapshot() {
        let elevated = high_priority_queues(&snapshot.queues);
        if !elevated.is_empty() {
            output.push_str(&format!("\n{}\n", "High priority tasks".bold()));
            output.push_str(&format_queue_tasks_table(&elevated));
            output.push('\n');
        }
    }

    let alerts = state.alerts();
    let open: Vec<Alert> = unacknowledged(&alerts)
        .into_iter()
        .take(DASHBOARD_ALERTS)
        .cloned()
        .collect();
    if !open.is_empty() {
        output.push_str(&format!("\n{}\n", "Alerts".bold()));
        output.push_str(&format_alerts_table(&open));
        output.push('\n');
    }

    let recent: Vec<&LogEntry> = state.logs().iter().take(DASHBOARD_LOGS).collect();
    if !recent.is_empty() {
        output.push_str(&format!("\n{}\n", "Recent logs".bold()));
        output.push_str(&format_logs_table(&recent));
        output.push('\n');
    }

    if let Some(at) = state.logs_received_at().or(state.snapshot_received_at()) {
        output.push_str(&format!(
            "\nLast update {}  (Ctrl-C to exit)\n",
            format_time(&at).dimmed()
        ));
    }

    output
}
