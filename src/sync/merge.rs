//! Log buffer merge and de-duplication.

use crate::snapshot::LogEntry;
use std::collections::HashSet;

/// Merge a freshly fetched batch into the held buffer.
///
/// Entries whose id is already held are dropped, as are repeats within the
/// batch (first occurrence wins). New entries go ahead of the held ones, the
/// result is stably sorted newest first and cut to `max`, so the oldest
/// entries are the ones evicted.
pub fn merge_logs(existing: &[LogEntry], incoming: Vec<LogEntry>, max: usize) -> Vec<LogEntry> {
    merge_logs_counted(existing, incoming, max).0
}

/// Like [`merge_logs`], also returning how many batch entries were new.
pub fn merge_logs_counted(
    existing: &[LogEntry],
    incoming: Vec<LogEntry>,
    max: usize,
) -> (Vec<LogEntry>, usize) {
    let held: HashSet<&str> = existing.iter().map(|entry| entry.id.as_str()).collect();
    let mut batch_ids: HashSet<String> = HashSet::with_capacity(incoming.len());

    let fresh: Vec<LogEntry> = incoming
        .into_iter()
        .filter(|entry| !held.contains(entry.id.as_str()) && batch_ids.insert(entry.id.clone()))
        .collect();
    let added = fresh.len();

    let mut merged = Vec::with_capacity(fresh.len() + existing.len());
    merged.extend(fresh);
    merged.extend_from_slice(existing);
    // sort_by is stable: equal timestamps keep new-before-held order.
    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged.truncate(max);

    (merged, added)
}
