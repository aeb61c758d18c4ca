//! Companion API commands: `chat`, `task`, `report`

use super::output::format_json;
use super::{ChatArgs, CliResult, ReportArgs, TaskArgs};
use crate::api::OracleApi;

/// Handle `oracle chat`
pub async fn handle_chat(args: &ChatArgs, api: &OracleApi) -> CliResult<String> {
    let message = args.message.join(" ");
    let response = api
        .chat_or_none(&message)
        .await
        .ok_or_else(|| format!("No reply from the companion API at {}", api.base_url()))?;

    Ok(response.reply)
}

/// Handle `oracle task`
pub async fn handle_task(args: &TaskArgs, api: &OracleApi) -> CliResult<String> {
    let created = api
        .create_task_or_none(&args.description, &args.priority)
        .await
        .ok_or_else(|| format!("Could not create task via {}", api.base_url()))?;

    if args.json {
        return Ok(format_json(&created)?);
    }
    Ok(format!("✓ Task {} ({})", created.task_id, created.status))
}

/// Handle `oracle report`
pub async fn handle_report(args: &ReportArgs, api: &OracleApi) -> CliResult<String> {
    if !args.output.is_dir() {
        return Err(format!("Not a directory: {}", args.output.display()).into());
    }

    let path = api
        .download_report_or_none(&args.output)
        .await
        .ok_or_else(|| format!("Could not download report from {}", api.base_url()))?;

    Ok(format!("✓ Report saved: {}", path.display()))
}
