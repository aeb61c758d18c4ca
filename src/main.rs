use clap::Parser;
use oracle::api::OracleApi;
use oracle::cli::{
    actions, fleet, handle_completions, handle_config_init, load_config, logs, open_store,
    snapshot, watch, Cli, CliResult, Commands, ConfigCommands,
};
use oracle::config::OracleConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    // Commands that never touch the store skip config loading entirely.
    match &cli.command {
        Commands::Config(ConfigCommands::Init(args)) => return handle_config_init(args),
        Commands::Completions(args) => {
            handle_completions(args);
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(&cli.config, cli.log_level.as_deref())?;
    oracle::logging::init_tracing(&config.logging)?;

    if let Commands::Watch(args) = &cli.command {
        return watch::handle_watch(args, config).await;
    }

    let output = dispatch(&cli.command, &config).await?;
    println!("{}", output);
    Ok(())
}

async fn dispatch(command: &Commands, config: &OracleConfig) -> CliResult<String> {
    match command {
        Commands::Snapshot(args) => snapshot::handle_snapshot(args, &open_store(config)?).await,
        Commands::Since(args) => snapshot::handle_since(args, &open_store(config)?).await,
        Commands::Diff(args) => snapshot::handle_diff(args, &open_store(config)?).await,
        Commands::Agents(args) => fleet::handle_agents(args, &open_store(config)?).await,
        Commands::Infra(args) => fleet::handle_infra(args, &open_store(config)?).await,
        Commands::Queues(args) => fleet::handle_queues(args, &open_store(config)?).await,
        Commands::Llm(args) => fleet::handle_llm(args, &open_store(config)?).await,
        Commands::Logs(args) => logs::handle_logs(args, &open_store(config)?).await,
        Commands::Alerts(args) => logs::handle_alerts(args, &open_store(config)?).await,
        Commands::Chat(args) => actions::handle_chat(args, &OracleApi::new(&config.api)?).await,
        Commands::Task(args) => actions::handle_task(args, &OracleApi::new(&config.api)?).await,
        Commands::Report(args) => {
            actions::handle_report(args, &OracleApi::new(&config.api)?).await
        }
        Commands::Watch(_) | Commands::Config(_) | Commands::Completions(_) => {
            Err("command does not produce a one-shot report".into())
        }
    }
}
