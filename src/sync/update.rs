use crate::snapshot::{LogEntry, SystemSnapshot};

/// One change flowing into the sync engine.
///
/// Realtime deliveries, snapshot polls and log polls all arrive as `Update`s
/// on a single channel, so the engine is the only writer of local state.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// A full snapshot; replaces the current one if it is not older.
    Snapshot(SystemSnapshot),
    /// A batch of recent logs to merge into the buffer.
    LogBatch(Vec<LogEntry>),
}

impl Update {
    pub fn kind(&self) -> &'static str {
        match self {
            Update::Snapshot(_) => "snapshot",
            Update::LogBatch(_) => "logs",
        }
    }
}

/// Requests from readers of the synced state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncCommand {
    /// Acknowledge the alert derived from the log entry with this id.
    Acknowledge(String),
}
