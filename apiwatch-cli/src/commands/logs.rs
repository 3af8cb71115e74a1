//! Request log command handlers
//!
//! Watching the live stream, listing stored entries and clearing them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use apiwatch_client::DashboardClient;
use apiwatch_core::domain::log::StatusClass;
use apiwatch_live::reconcile::ExpandState;
use apiwatch_live::render::logs::{Badge, LogRow};
use apiwatch_live::render::{LogListView, render_logs};
use apiwatch_live::{Config, LogsView};
use clap::Subcommand;
use colored::*;
use tracing::info;

use super::{report, rule};

/// Log subcommands
#[derive(Subcommand)]
pub enum LogCommands {
    /// Follow the live log stream
    Watch {
        /// Also write the rendered markup to this file after every update
        #[arg(long)]
        html: Option<PathBuf>,

        /// Show details for these entry ids
        #[arg(long)]
        expand: Vec<String>,

        /// Refetch the list on an interval instead of using the stream
        #[arg(long)]
        poll: bool,
    },
    /// List stored log entries
    List {
        /// Maximum number of entries
        #[arg(short, long)]
        limit: Option<usize>,

        /// Keep refreshing until interrupted
        #[arg(short, long)]
        follow: bool,
    },
    /// Delete all stored log entries
    Clear,
}

/// Handle log commands
pub async fn handle_log_command(command: LogCommands, config: &Config) -> Result<()> {
    let client = Arc::new(DashboardClient::new(config.base_url.clone()));

    match command {
        LogCommands::Watch { html, expand, poll } => {
            let view = if poll {
                LogsView::open_polling(client, config)
            } else {
                LogsView::open(client, config)
            };
            watch_logs(view, html.as_deref(), &expand).await
        }
        LogCommands::List { limit, follow } => {
            let mut config = config.clone();
            if let Some(limit) = limit {
                config.log_limit = limit;
            }
            if follow {
                watch_logs(LogsView::open_polling(client, &config), None, &[]).await
            } else {
                list_logs(&client, config.log_limit).await
            }
        }
        LogCommands::Clear => clear_logs(LogsView::open_polling(client, config)).await,
    }
}

async fn watch_logs(
    mut view: LogsView<DashboardClient>,
    html: Option<&Path>,
    expand: &[String],
) -> Result<()> {
    println!("{}", "Watching request logs (Ctrl-C to stop)".bold());

    loop {
        let frame = tokio::select! {
            frame = view.next_frame() => frame,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(mut frame) = frame else { break };

        if expand_requested(&mut view, expand) {
            frame.view = view.render();
        }

        println!("{}", rule());
        if let Some(state) = view.connection_state() {
            println!("{}", format!("stream: {:?}", state).dimmed());
        }
        print_log_list(&frame.view);
        for id in &frame.autoscroll {
            println!("{}", format!("  output of {} grew", id).dimmed());
        }

        if let Some(path) = html {
            write_html(path, &frame.view).await?;
        }
    }

    view.close();
    info!("Stopped watching logs");
    Ok(())
}

/// Expands requested entries that are present but still collapsed
fn expand_requested(view: &mut LogsView<DashboardClient>, ids: &[String]) -> bool {
    let mut changed = false;
    for id in ids {
        if !view.is_expanded(id) && view.toggle(id) {
            changed = true;
        }
    }
    changed
}

async fn list_logs(client: &DashboardClient, limit: usize) -> Result<()> {
    let entries = client.list_logs(limit).await.context("Failed to fetch logs")?;
    let view = render_logs(&entries, &ExpandState::new());

    if !view.is_empty() {
        println!("{}", format!("Found {} log entries:", view.rows.len()).bold());
        println!();
    }
    print_log_list(&view);

    Ok(())
}

async fn clear_logs(mut view: LogsView<DashboardClient>) -> Result<()> {
    let notice = view.clear_logs().await;
    view.close();
    report(notice)?;
    print_log_list(&view.render());
    Ok(())
}

async fn write_html(path: &Path, view: &LogListView) -> Result<()> {
    tokio::fs::write(path, view.to_html())
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn print_log_list(view: &LogListView) {
    if view.is_empty() {
        println!("{}", apiwatch_live::render::logs::EMPTY_LOGS.yellow());
        return;
    }
    for row in &view.rows {
        print_log_row(row);
    }
}

fn print_log_row(row: &LogRow) {
    let live = if row.live_output { " ●".green() } else { "".normal() };
    let toggle = if row.expanded { "▲" } else { "▼" };

    println!(
        "  {} {} {} {}{} {}",
        toggle.dimmed(),
        colorize_method(&row.method),
        row.path,
        colorize_badge(&row.badge),
        live,
        row.timestamp.dimmed()
    );

    let Some(details) = &row.details else {
        return;
    };
    println!("    {} {}", "id:".dimmed(), row.id.dimmed());
    println!("    {} {}", "Query:".bold(), details.query_params);
    println!("    {} {}", "Headers:".bold(), details.headers);
    if !details.prints.is_empty() {
        println!("    {}", "Output:".bold());
        for line in details.prints.lines() {
            println!("      {}", line);
        }
    }
    if let Some(body) = &details.response_body {
        println!("    {} {}", "Response:".bold(), body);
    }
    println!("    {} {}", "IP:".bold(), details.client_ip);
    if let Some(time) = &details.response_time {
        println!("    {} {}", "Time:".bold(), time);
    }
}

fn colorize_method(method: &str) -> ColoredString {
    match method {
        "GET" => method.blue(),
        "POST" => method.green(),
        "PUT" | "PATCH" => method.yellow(),
        "DELETE" => method.red(),
        _ => method.normal(),
    }
}

fn colorize_badge(badge: &Badge) -> ColoredString {
    let text = badge.text();
    match badge {
        Badge::Executing => text.cyan(),
        Badge::Status { class, .. } => match class {
            StatusClass::Success => text.green(),
            StatusClass::ClientError => text.yellow(),
            StatusClass::ServerError => text.red(),
        },
    }
}
