mod api;
mod codes;
mod config;
mod server;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};

use crate::config::AppConfig;

/// Toolkit demo - user directory service wired with the toolkit crates
#[derive(Parser)]
#[command(name = "toolkit-demo")]
#[command(about = "Toolkit demo - user directory service wired with the toolkit crates")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address override, e.g. 127.0.0.1:8087 (overrides config)
    #[arg(short, long)]
    bind: Option<String>,

    /// Print effective configuration (JSON) and exit
    #[arg(long)]
    print_config: bool,

    #[command(flatten)]
    log: toolkit_log::Options,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    // Layered config:
    // 1) defaults -> 2) YAML (if provided) -> 3) env (TOOLKIT__*) -> 4) CLI overrides
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.bind.as_deref(), &cli.log, &matches);
    config.validate()?;

    if cli.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let _log_guard = config.logging.init()?;
    tracing::info!(logger = %config.logging.name, "toolkit-demo starting");

    codes::register();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => server::run(config).await,
        Commands::Check => {
            println!("Configuration is valid");
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}
