//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod jobs;
mod logs;

pub use jobs::JobCommands;
pub use logs::LogCommands;

use anyhow::Result;
use apiwatch_live::{Config, Notice};
use clap::Subcommand;
use colored::*;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Request logs
    Logs {
        #[command(subcommand)]
        command: LogCommands,
    },
    /// Background jobs
    Jobs {
        #[command(subcommand)]
        command: JobCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Logs { command } => logs::handle_log_command(command, config).await,
        Commands::Jobs { command } => jobs::handle_job_command(command, config).await,
    }
}

fn rule() -> ColoredString {
    "─".repeat(80).dimmed()
}

/// Prints a successful notice, or turns a failed one into an error
fn report(notice: Notice) -> Result<()> {
    if notice.is_error() {
        anyhow::bail!(notice.message);
    }
    println!("{} {}", "✓".green(), notice.message);
    Ok(())
}
