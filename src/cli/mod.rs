//! CLI module for Oracle Monitor
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `watch` - Live mission-control summary, redrawn on every change
//! - `snapshot`, `since`, `diff` - Inspect stored snapshots
//! - `agents`, `infra`, `queues`, `llm` - Views over the latest snapshot
//! - `logs`, `alerts` - Recent log lines and derived alerts
//! - `chat`, `task`, `report` - Companion API calls
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Follow the system live
//! oracle watch
//!
//! # Active agents that may use gpt-4o
//! oracle agents --status active --model gpt-4o
//!
//! # Generate shell completions
//! oracle completions bash > ~/.bash_completion.d/oracle
//! ```

pub mod actions;
pub mod completions;
pub mod config;
pub mod fleet;
pub mod logs;
pub mod output;
pub mod snapshot;
pub mod watch;

pub use completions::handle_completions;
pub use config::handle_config_init;

use crate::config::OracleConfig;
use crate::snapshot::{LogLevel, SystemSnapshot};
use crate::store::{RestStore, SnapshotStore};
use crate::views::StatusFilter;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Result type shared by command handlers.
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Oracle Monitor - live view of agents, workloads, queues and LLM usage
#[derive(Parser, Debug)]
#[command(
    name = "oracle",
    version,
    about = "Terminal client for the Oracle Monitor snapshot store"
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "oracle.toml")]
    pub config: PathBuf,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Follow the system live until interrupted
    Watch(WatchArgs),
    /// Show the latest snapshot
    Snapshot(JsonArgs),
    /// List snapshots taken in the last N minutes
    Since(SinceArgs),
    /// Compare two snapshots by id
    Diff(DiffArgs),
    /// List agents
    Agents(AgentsArgs),
    /// Show pods and deployments
    Infra(JsonArgs),
    /// Show queues
    Queues(QueuesArgs),
    /// Show language model usage and cost
    Llm(JsonArgs),
    /// Show recent log lines
    Logs(LogsArgs),
    /// Show alerts derived from recent warnings and errors
    Alerts(AlertsArgs),
    /// Ask the assistant about the system
    Chat(ChatArgs),
    /// Queue a new task
    Task(TaskArgs),
    /// Download the progress report (PDF)
    Report(ReportArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Poll for snapshots instead of subscribing to the realtime feed
    #[arg(long)]
    pub no_realtime: bool,

    /// Log poll interval in seconds
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Render once after the initial fetch and exit
    #[arg(long)]
    pub once: bool,

    /// Output as JSON (one summary object per update)
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct JsonArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SinceArgs {
    /// Look-back window in minutes
    pub minutes: u32,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Older snapshot id
    pub from: String,

    /// Newer snapshot id
    pub to: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct AgentsArgs {
    /// Case-insensitive text matched against name and description
    #[arg(short, long)]
    pub search: Option<String>,

    /// Filter by activity (all, active, idle)
    #[arg(long, default_value = "all")]
    pub status: StatusFilter,

    /// Only agents allowed to use this model
    #[arg(short, long)]
    pub model: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct QueuesArgs {
    /// Only critical and high priority tasks
    #[arg(short, long)]
    pub priority: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Number of recent entries to fetch
    #[arg(short = 'n', long, default_value = "100")]
    pub limit: usize,

    /// Case-insensitive text matched against message, source and level
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Only entries at this level (debug, info, warning, error)
    #[arg(long)]
    pub level: Option<LogLevel>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct AlertsArgs {
    /// Number of recent log entries to derive alerts from
    #[arg(short = 'n', long, default_value = "200")]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Question to ask
    #[arg(required = true, num_args = 1..)]
    pub message: Vec<String>,
}

#[derive(Args, Debug)]
pub struct TaskArgs {
    /// What the task should do
    pub description: String,

    /// Task priority (low, medium, high, critical)
    #[arg(short, long, default_value = crate::api::DEFAULT_TASK_PRIORITY)]
    pub priority: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Directory to save the report into
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "oracle.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// Load configuration with precedence CLI > env > file > defaults.
///
/// A missing file at `path` is not an error; defaults are used.
pub fn load_config(path: &Path, log_level: Option<&str>) -> CliResult<OracleConfig> {
    let mut config = if path.exists() {
        OracleConfig::load(Some(path))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        OracleConfig::default()
    };

    config = config.with_env_overrides();

    if let Some(level) = log_level {
        config.logging.level = level.to_string();
    }

    config.validate()?;
    Ok(config)
}

/// Build the store client for commands that read snapshots or logs.
pub fn open_store(config: &OracleConfig) -> CliResult<RestStore> {
    config.require_store()?;
    Ok(RestStore::new(&config.store)?)
}

/// Latest snapshot, or an error explaining that none exists yet.
pub async fn require_latest(store: &dyn SnapshotStore) -> CliResult<SystemSnapshot> {
    store
        .latest_snapshot()
        .await?
        .ok_or_else(|| "No snapshots found. Is the collector running?".into())
}
