//! Log commands: `logs`, `alerts`

use super::output::{format_alerts_table, format_json, format_logs_table};
use super::{AlertsArgs, CliResult, LogsArgs};
use crate::store::SnapshotStore;
use crate::sync::merge_logs;
use crate::views::{derive_alerts, error_count, filter_logs, LogFilter};
use std::collections::HashSet;

/// Handle `oracle logs`
pub async fn handle_logs(args: &LogsArgs, store: &dyn SnapshotStore) -> CliResult<String> {
    // Same de-duplication and ordering as the live buffer.
    let logs = merge_logs(&[], store.recent_logs(args.limit).await?, args.limit);
    let filter = LogFilter {
        text: args.filter.clone().unwrap_or_default(),
        level: args.level,
    };
    let shown = filter_logs(&logs, &filter);

    if args.json {
        return Ok(format_json(&shown)?);
    }
    if shown.is_empty() {
        return Ok("No matching log entries".to_string());
    }

    Ok(format!(
        "{}\n{} of {} entries shown, {} errors",
        format_logs_table(&shown),
        shown.len(),
        logs.len(),
        error_count(&logs)
    ))
}

/// Handle `oracle alerts`
pub async fn handle_alerts(args: &AlertsArgs, store: &dyn SnapshotStore) -> CliResult<String> {
    let logs = merge_logs(&[], store.recent_logs(args.limit).await?, args.limit);
    // Acknowledgements live only in a running `watch` session.
    let alerts = derive_alerts(&logs, &HashSet::new());

    if args.json {
        return Ok(format_json(&alerts)?);
    }
    if alerts.is_empty() {
        return Ok("No alerts".to_string());
    }
    Ok(format_alerts_table(&alerts))
}
