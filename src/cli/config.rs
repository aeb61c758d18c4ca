//! Config command handlers

use crate::cli::ConfigInitArgs;
use crate::config::{OracleConfig, StoreConfig};
use std::fs;
use std::path::Path;

const EXAMPLE_CONFIG: &str = include_str!("../../oracle.example.toml");

/// Handle `oracle config init` command
pub fn handle_config_init(args: &ConfigInitArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.output.exists() && !args.force {
        return Err(format!(
            "File already exists: {}. Use --force to overwrite.",
            args.output.display()
        )
        .into());
    }

    fs::write(&args.output, EXAMPLE_CONFIG)?;

    println!("✓ Configuration file created: {}", args.output.display());
    let store = OracleConfig::default().with_env_overrides().store;
    for step in next_steps(&store, &args.output) {
        println!("  {}", step);
    }

    Ok(())
}

/// What is still needed before `oracle watch` can reach the store, given
/// the settings already present in the environment.
fn next_steps(store: &StoreConfig, output: &Path) -> Vec<String> {
    let mut steps = Vec::new();
    if store.url.trim().is_empty() {
        steps.push(format!(
            "Set store.url in {}, or export SUPABASE_URL",
            output.display()
        ));
    }
    if store.api_key.trim().is_empty() {
        steps.push(format!(
            "Set store.api_key in {}, or export SUPABASE_KEY",
            output.display()
        ));
    }
    if steps.is_empty() {
        steps.push(format!("Store found in the environment ({})", store.url));
    }
    if !store.realtime {
        steps.push("ORACLE_REALTIME is off; snapshots will be polled".to_string());
    }
    steps.push(format!("Then run: oracle --config {} watch", output.display()));
    steps
}
