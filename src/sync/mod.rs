//! Client-side synchronization of snapshots and logs.
//!
//! Producers (initial fetch, realtime feed, pollers) turn store reads into
//! [`Update`]s. The [`SyncEngine`] consumes them, applies them to the single
//! [`SyncState`] it owns and publishes the result.

mod engine;
mod merge;
mod poller;
mod state;
mod update;

pub use engine::SyncEngine;
pub use merge::{merge_logs, merge_logs_counted};
pub use poller::{PollTarget, Poller};
pub use state::{SnapshotApply, SyncState};
pub use update::{SyncCommand, Update};
