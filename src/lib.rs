//! Oracle Monitor - client-side system-state sync
//!
//! Keeps a local, continuously updated view of an agent platform: the latest
//! system snapshot (agents, workloads, queues, language-model usage) plus a
//! bounded, de-duplicated buffer of recent log lines. Snapshots arrive over a
//! realtime subscription, logs by polling, and both are merged by a single
//! writer before any view is derived.

pub mod api;
pub mod cli;
pub mod config;
pub mod logging;
pub mod snapshot;
pub mod store;
pub mod sync;
pub mod views;
