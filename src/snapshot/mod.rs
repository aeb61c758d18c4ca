//! Snapshot data model.
//!
//! A [`SystemSnapshot`] is one server-produced, point-in-time view of the
//! whole monitored system. Snapshots are read-only on this side: a newer one
//! supersedes the previous one, nothing is ever patched in place.
//!
//! Log records ([`LogEntry`]) live in a separate table and are polled
//! independently of snapshots.

mod log_entry;
mod time;
mod types;

pub use log_entry::*;
pub use types::*;

pub use time::parse_timestamp;

pub(crate) use time::deserialize_timestamp;
