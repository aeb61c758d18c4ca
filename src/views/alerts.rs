//! Alerts derived from warning and error log lines.

use crate::snapshot::{LogEntry, LogLevel};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// A warning or error log line projected for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    /// Id of the source log entry
    pub id: String,
    pub level: LogLevel,
    pub message: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub acknowledged: bool,
}

/// Project the alert-level entries of `logs`, in buffer order.
pub fn derive_alerts(logs: &[LogEntry], acknowledged: &HashSet<String>) -> Vec<Alert> {
    logs.iter()
        .filter(|entry| entry.level.is_alert())
        .map(|entry| Alert {
            id: entry.id.clone(),
            level: entry.level,
            message: entry.message.clone(),
            source: entry.source.clone(),
            timestamp: entry.timestamp,
            acknowledged: acknowledged.contains(&entry.id),
        })
        .collect()
}

pub fn unacknowledged(alerts: &[Alert]) -> Vec<&Alert> {
    alerts.iter().filter(|a| !a.acknowledged).collect()
}
