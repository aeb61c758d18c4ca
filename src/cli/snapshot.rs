//! Snapshot inspection commands: `snapshot`, `since`, `diff`

use super::output::{format_diff, format_json, format_snapshots_table, format_summary};
use super::{require_latest, CliResult, DiffArgs, JsonArgs, SinceArgs};
use crate::store::SnapshotStore;
use crate::views::{diff_snapshots, Summary};
use chrono::{Duration, Utc};

/// Handle `oracle snapshot`
pub async fn handle_snapshot(args: &JsonArgs, store: &dyn SnapshotStore) -> CliResult<String> {
    let snapshot = require_latest(store).await?;

    if args.json {
        Ok(format_json(&snapshot)?)
    } else {
        Ok(format_summary(&Summary::from_snapshot(&snapshot)))
    }
}

/// Handle `oracle since <minutes>`
pub async fn handle_since(args: &SinceArgs, store: &dyn SnapshotStore) -> CliResult<String> {
    let cutoff = Utc::now() - Duration::minutes(i64::from(args.minutes));
    let snapshots = store.snapshots_since(cutoff).await?;

    if args.json {
        return Ok(format_json(&snapshots)?);
    }
    if snapshots.is_empty() {
        return Ok(format!("No snapshots in the last {} minutes", args.minutes));
    }
    Ok(format_snapshots_table(&snapshots))
}

/// Handle `oracle diff <from> <to>`
pub async fn handle_diff(args: &DiffArgs, store: &dyn SnapshotStore) -> CliResult<String> {
    let (from, to) = tokio::join!(
        store.snapshot_by_id(&args.from),
        store.snapshot_by_id(&args.to)
    );
    let from = from?.ok_or_else(|| format!("Snapshot not found: {}", args.from))?;
    let to = to?.ok_or_else(|| format!("Snapshot not found: {}", args.to))?;

    let diff = diff_snapshots(&from, &to);
    if args.json {
        Ok(format_json(&diff)?)
    } else {
        Ok(format_diff(&diff))
    }
}
