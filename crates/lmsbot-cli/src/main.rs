//! lmsbot - keeps a local mirror of LMS courses and pings a Telegram chat
//!
//! Polls the LMS on an interval, downloads lecture files, announces new
//! assignments, announcements and files, and sends D-3/D-1/D-day reminders.

mod cli;
mod commands;
mod config;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::run::{run_loop, run_once};
use crate::commands::status::run_status;
use crate::config::{resolve_db_path, AppConfig};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "lmsbot=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_loop(&load_config(cli)?).await?,
        Commands::Once => run_once(&load_config(cli)?).await?,
        Commands::Status { json } => run_status(&resolve_db_path(cli.db_path), json)?,
    }

    Ok(())
}

fn load_config(cli: Cli) -> Result<AppConfig, CliError> {
    let config = AppConfig::from_env()?.with_overrides(cli.db_path, cli.download_dir);
    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}
