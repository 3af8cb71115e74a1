//! Job command handlers
//!
//! Handles background-job commands: watching and listing jobs, reading a
//! job's log history, and stopping or deleting jobs.

use std::sync::Arc;

use anyhow::{Context, Result};
use apiwatch_client::DashboardClient;
use apiwatch_core::domain::job::{JobLogLevel, JobStatus};
use apiwatch_live::render::jobs::{EMPTY_JOBS, EMPTY_JOB_LOG, JobLogRow, JobRow};
use apiwatch_live::render::{JobListView, JobLogPane};
use apiwatch_live::view::JobBoard;
use apiwatch_live::{Config, JobLogViewer, JobsView};
use clap::Subcommand;
use colored::*;

use super::{report, rule};

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// Keep the job list refreshed until interrupted
    Watch,
    /// List all jobs, newest first
    List,
    /// Show a job's log history
    Logs {
        /// Job ID
        id: String,

        /// Maximum number of lines
        #[arg(short, long)]
        limit: Option<usize>,

        /// Keep refreshing until interrupted
        #[arg(short, long)]
        follow: bool,
    },
    /// Ask a running job to stop
    Stop {
        /// Job ID
        id: String,
    },
    /// Permanently delete a job and its logs
    Delete {
        /// Job ID
        id: String,
    },
}

/// Handle job commands
pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let client = Arc::new(DashboardClient::new(config.base_url.clone()));

    match command {
        JobCommands::Watch => watch_jobs(JobsView::open(client, config)).await,
        JobCommands::List => list_jobs(&client).await,
        JobCommands::Logs { id, limit, follow } => {
            let limit = limit.unwrap_or(config.job_log_limit);
            let refresh = follow.then_some(config.refresh_interval);
            show_job_logs(JobLogViewer::open(client, id, limit, refresh), follow).await
        }
        JobCommands::Stop { id } => stop_job(JobsView::open(client, config), &id).await,
        JobCommands::Delete { id } => delete_job(JobsView::open(client, config), &id).await,
    }
}

async fn watch_jobs(mut view: JobsView<DashboardClient>) -> Result<()> {
    println!("{}", "Watching background jobs (Ctrl-C to stop)".bold());

    loop {
        let frame = tokio::select! {
            frame = view.next_frame() => frame,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(frame) = frame else { break };

        println!("{}", rule());
        print_job_list(&frame);
    }

    view.close();
    Ok(())
}

async fn list_jobs(client: &DashboardClient) -> Result<()> {
    let jobs = client.list_jobs().await.context("Failed to fetch jobs")?;
    let mut board = JobBoard::new();
    board.replace(jobs);
    let view = board.render();

    if !view.is_empty() {
        println!("{}", format!("Found {} job(s):", view.rows.len()).bold());
        println!();
    }
    print_job_list(&view);

    Ok(())
}

async fn show_job_logs(mut viewer: JobLogViewer<DashboardClient>, follow: bool) -> Result<()> {
    println!("{}", format!("Logs for job {}:", viewer.job_id()).bold());

    loop {
        let pane = tokio::select! {
            pane = viewer.next_pane() => pane,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(pane) = pane else { break };

        println!("{}", rule());
        print_job_log(&pane);
        if !follow {
            break;
        }
    }

    viewer.close();
    Ok(())
}

async fn stop_job(mut view: JobsView<DashboardClient>, id: &str) -> Result<()> {
    view.sync().await.context("Failed to fetch jobs")?;
    let notice = view.stop(id).await;
    view.close();
    report(notice)
}

async fn delete_job(mut view: JobsView<DashboardClient>, id: &str) -> Result<()> {
    let notice = view.delete(id).await;
    view.close();
    report(notice)
}

fn print_job_list(view: &JobListView) {
    if view.is_empty() {
        println!("{}", EMPTY_JOBS.yellow());
        return;
    }
    for row in &view.rows {
        print_job_summary(row);
    }
}

fn print_job_summary(row: &JobRow) {
    println!("  {} {} {}", "▸".cyan(), row.job_type.bold(), row.id.dimmed());
    println!("    Status:   {}", colorize_status(&row.status));
    println!("    Started:  {}", row.started.dimmed());
    if let Some(finished) = &row.finished {
        println!("    Finished: {}", finished.dimmed());
    }
    if let Some(duration) = &row.duration {
        println!("    Duration: {}", duration);
    }
    if let Some(summary) = &row.summary {
        println!("    Result:   {}", summary);
    }
    if let Some(error) = &row.error {
        println!("    Error:    {}", error.red());
    }
    if row.can_stop {
        println!(
            "    {}",
            format!("apiwatch jobs stop {}", row.id).dimmed()
        );
    }
    println!();
}

fn print_job_log(pane: &JobLogPane) {
    match pane {
        JobLogPane::Error(message) => {
            println!("{} {}", "Failed to load logs:".red(), message);
        }
        JobLogPane::Lines(rows) if rows.is_empty() => println!("{}", EMPTY_JOB_LOG.yellow()),
        JobLogPane::Lines(rows) => {
            for row in rows {
                print_log_line(row);
            }
        }
    }
}

fn print_log_line(row: &JobLogRow) {
    let level = row.level.as_str().to_uppercase();
    let level = match row.level {
        JobLogLevel::Info => level.cyan(),
        JobLogLevel::Warning => level.yellow(),
        JobLogLevel::Error => level.red(),
        JobLogLevel::Success => level.green(),
    };

    println!("{} [{}] {}", row.timestamp.dimmed(), level, row.message);
}

/// Colorize job status for display
fn colorize_status(status: &JobStatus) -> ColoredString {
    let text = status.as_str();
    match status {
        JobStatus::Running => text.cyan(),
        JobStatus::Completed => text.green(),
        JobStatus::Failed => text.red(),
    }
}
