//! Watch command implementation

use super::output::format_dashboard;
use super::{open_store, CliResult, WatchArgs};
use crate::config::OracleConfig;
use crate::store::SnapshotStore;
use crate::sync::{SyncCommand, SyncEngine, SyncState};
use crate::views::Summary;
use std::io::{BufRead, IsTerminal};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

/// Apply `watch` flags on top of the loaded configuration.
pub fn apply_watch_overrides(args: &WatchArgs, config: &mut OracleConfig) {
    if let Some(interval) = args.interval {
        config.sync.log_poll_interval_seconds = interval;
    }
    if args.no_realtime {
        config.store.realtime = false;
    }
}

/// Handle `oracle watch`
pub async fn handle_watch(args: &WatchArgs, mut config: OracleConfig) -> CliResult<()> {
    apply_watch_overrides(args, &mut config);
    config.validate()?;

    let store: Arc<dyn SnapshotStore> = Arc::new(open_store(&config)?);
    let engine = SyncEngine::new(store, config.sync.clone(), config.store.realtime);
    let mut updates = engine.watch();
    let commands = engine.commands();

    let cancel_token = CancellationToken::new();
    let handle = engine.start(cancel_token.clone());

    if args.once {
        let rendered = {
            let state = updates
                .wait_for(|state| state.is_ready() || state.is_disposed())
                .await?;
            render(&state, args.json)?
        };
        println!("{}", rendered);
        cancel_token.cancel();
        handle.await?;
        return Ok(());
    }

    tokio::spawn(shutdown_signal(cancel_token.clone()));

    let interactive = std::io::stdout().is_terminal() && !args.json;
    if interactive && std::io::stdin().is_terminal() {
        spawn_ack_reader(commands);
    }

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let rendered = {
                    let state = updates.borrow_and_update();
                    if !state.is_ready() || state.is_disposed() {
                        continue;
                    }
                    render(&state, args.json)?
                };
                if interactive {
                    print!("{}", CLEAR_SCREEN);
                }
                println!("{}", rendered);
            }
        }
    }

    let final_state = handle.await?;
    tracing::info!(
        logs = final_state.logs().len(),
        acknowledged = final_state.acknowledged().len(),
        "Watch stopped"
    );
    Ok(())
}

fn render(state: &SyncState, json: bool) -> CliResult<String> {
    if json {
        // One object per line so the stream can be piped.
        Ok(serde_json::to_string(&Summary::from_state(state))?)
    } else {
        Ok(format_dashboard(state))
    }
}

/// Parse an acknowledgement typed on stdin: `ack <alert-id>`.
pub fn parse_ack_command(line: &str) -> Option<SyncCommand> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("ack" | "a"), Some(id), None) => Some(SyncCommand::Acknowledge(id.to_string())),
        _ => None,
    }
}

// A plain thread so a pending stdin read never holds up runtime shutdown.
fn spawn_ack_reader(commands: mpsc::Sender<SyncCommand>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_ack_command(&line) {
                Some(command) => {
                    if commands.blocking_send(command).is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => tracing::warn!(input = %line, "Unrecognised input, expected `ack <alert-id>`"),
            }
        }
    });
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }

    cancel_token.cancel();
}
