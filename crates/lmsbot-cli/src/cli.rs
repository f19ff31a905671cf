use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lmsbot")]
#[command(about = "Mirror LMS courses locally and send Telegram reminders")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Root directory for downloaded lecture files
    #[arg(long, global = true, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Poll the LMS on an interval until interrupted (default)
    Run,
    /// Run a single cycle now, ignoring quiet hours
    Once,
    /// Show mirror and reminder state
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
