//! Log buffer filters and counts.

use crate::snapshot::{LogEntry, LogLevel};

/// Text and level filter for the log table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    /// Case-insensitive needle matched against message, source and level
    pub text: String,
    pub level: Option<LogLevel>,
}

impl LogFilter {
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(level) = self.level {
            if entry.level != level {
                return false;
            }
        }

        let needle = self.text.trim().to_lowercase();
        needle.is_empty()
            || entry.message.to_lowercase().contains(&needle)
            || entry.source.to_lowercase().contains(&needle)
            || entry.level.as_str().contains(&needle)
    }
}

pub fn filter_logs<'a>(logs: &'a [LogEntry], filter: &LogFilter) -> Vec<&'a LogEntry> {
    logs.iter().filter(|entry| filter.matches(entry)).collect()
}

/// Error-level entries in the buffer.
pub fn error_count(logs: &[LogEntry]) -> usize {
    logs.iter().filter(|e| e.level == LogLevel::Error).count()
}
