//! Request log rendering

use std::fmt::Write;

use apiwatch_core::domain::log::{ExecutionState, FieldMap, LogEntry, StatusClass};

use super::{escape_html, human_time};
use crate::reconcile::ExpandState;

/// Placeholder shown when no entries are held
pub const EMPTY_LOGS: &str = "No logs yet";

/// Display structure for the request log list
#[derive(Debug, Clone, PartialEq)]
pub struct LogListView {
    pub rows: Vec<LogRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub id: String,
    pub method: String,
    pub path: String,
    pub badge: Badge,
    pub timestamp: String,
    /// Executing with output already captured
    pub live_output: bool,
    pub expanded: bool,
    /// Present only for expanded rows
    pub details: Option<LogDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Badge {
    Executing,
    Status { code: u16, class: StatusClass },
}

impl Badge {
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Executing => "status-executing",
            Self::Status { class, .. } => match class {
                StatusClass::Success => "status-2xx",
                StatusClass::ClientError => "status-4xx",
                StatusClass::ServerError => "status-5xx",
            },
        }
    }

    pub fn text(&self) -> String {
        match self {
            Self::Executing => "executing".to_string(),
            Self::Status { code, .. } => code.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogDetails {
    pub query_params: String,
    pub headers: String,
    pub prints: String,
    pub response_body: Option<String>,
    pub client_ip: String,
    pub response_time: Option<String>,
}

/// Render entries in the order given
pub fn render_logs(entries: &[LogEntry], expanded: &ExpandState) -> LogListView {
    LogListView {
        rows: entries
            .iter()
            .map(|entry| render_row(entry, expanded.is_expanded(&entry.id)))
            .collect(),
    }
}

fn render_row(entry: &LogEntry, expanded: bool) -> LogRow {
    let (badge, live_output) = match &entry.state {
        ExecutionState::Executing { prints } => (Badge::Executing, !prints.is_empty()),
        ExecutionState::Completed(done) => (
            Badge::Status {
                code: done.status_code,
                class: done.status_class(),
            },
            false,
        ),
    };

    LogRow {
        id: entry.id.clone(),
        method: entry.method.clone(),
        path: entry.path.clone(),
        badge,
        timestamp: human_time(&entry.timestamp),
        live_output,
        expanded,
        details: expanded.then(|| render_details(entry)),
    }
}

fn render_details(entry: &LogEntry) -> LogDetails {
    let (response_body, response_time) = match &entry.state {
        ExecutionState::Executing { .. } => (None, None),
        ExecutionState::Completed(done) => (
            Some(done.response_body.clone()),
            Some(format!("{:.2} ms", done.response_time_ms)),
        ),
    };

    LogDetails {
        query_params: pretty(&entry.query_params),
        headers: pretty(&entry.headers),
        prints: entry.prints().to_string(),
        response_body,
        client_ip: entry.client_ip.clone().unwrap_or_else(|| "N/A".to_string()),
        response_time,
    }
}

fn pretty(fields: &FieldMap) -> String {
    serde_json::to_string_pretty(fields).unwrap_or_default()
}

fn method_class(method: &str) -> String {
    let cleaned: String = method.chars().filter(char::is_ascii_alphanumeric).collect();
    format!("method-{}", cleaned)
}

impl LogListView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_html(&self) -> String {
        if self.rows.is_empty() {
            return format!("<div class=\"empty-logs\">{}</div>", EMPTY_LOGS);
        }

        let mut html = String::new();
        for row in &self.rows {
            row.write_html(&mut html);
        }
        html
    }
}

impl LogRow {
    fn write_html(&self, html: &mut String) {
        let _ = write!(
            html,
            "<div class=\"log-item\" data-id=\"{}\"><div class=\"log-header\">",
            escape_html(&self.id)
        );
        let _ = write!(
            html,
            "<span class=\"log-method {}\">{}</span>",
            method_class(&self.method),
            escape_html(&self.method)
        );
        let _ = write!(
            html,
            "<span class=\"log-path\">{}</span>",
            escape_html(&self.path)
        );
        let _ = write!(
            html,
            "<span class=\"log-status {}\">{}</span>",
            self.badge.css_class(),
            self.badge.text()
        );
        if self.live_output {
            html.push_str("<span class=\"log-live\" title=\"output captured\">●</span>");
        }
        let _ = write!(
            html,
            "<span class=\"log-timestamp\">{}</span><span class=\"log-toggle\">{}</span></div>",
            self.timestamp,
            if self.expanded { "▲" } else { "▼" }
        );

        if let Some(details) = &self.details {
            html.push_str("<div class=\"log-details\">");
            section(html, "Query", &details.query_params);
            section(html, "Headers", &details.headers);
            if !details.prints.is_empty() {
                section(html, "Output", &details.prints);
            }
            if let Some(body) = &details.response_body {
                section(html, "Response", body);
            }
            section(html, "IP", &details.client_ip);
            if let Some(time) = &details.response_time {
                section(html, "Time", time);
            }
            html.push_str("</div>");
        }

        html.push_str("</div>");
    }
}

fn section(html: &mut String, title: &str, content: &str) {
    let _ = write!(
        html,
        "<div class=\"log-section\"><div class=\"log-section-title\">{}:</div>\
         <div class=\"log-section-content\">{}</div></div>",
        title,
        escape_html(content)
    );
}
