//! Background job rendering

use std::fmt::Write;

use apiwatch_core::domain::job::{JobLogLevel, JobLogLine, JobRecord, JobStatus};

use super::{escape_html, human_time};

pub const EMPTY_JOBS: &str = "No background jobs";
pub const EMPTY_JOB_LOG: &str = "No log lines yet";

/// Display structure for the job list
#[derive(Debug, Clone, PartialEq)]
pub struct JobListView {
    pub rows: Vec<JobRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobRow {
    pub id: String,
    pub job_type: String,
    pub status: JobStatus,
    pub started: String,
    pub finished: Option<String>,
    pub duration: Option<String>,
    /// Offered only while the job is running
    pub can_stop: bool,
    pub summary: Option<String>,
    pub error: Option<String>,
}

/// Render jobs in the order given
pub fn render_jobs(jobs: &[JobRecord]) -> JobListView {
    JobListView {
        rows: jobs.iter().map(render_job).collect(),
    }
}

fn render_job(job: &JobRecord) -> JobRow {
    let terminal = job.status.is_terminal();
    JobRow {
        id: job.id.clone(),
        job_type: job.job_type.clone(),
        status: job.status,
        started: human_time(&job.started_at),
        finished: job.completed_at.as_ref().filter(|_| terminal).map(human_time),
        duration: job
            .duration()
            .map(|elapsed| format!("{}s", elapsed.num_seconds())),
        can_stop: job.can_stop(),
        summary: job.result_summary.clone().filter(|_| terminal),
        error: job
            .error_message
            .clone()
            .filter(|_| job.status == JobStatus::Failed),
    }
}

impl JobListView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_html(&self) -> String {
        if self.rows.is_empty() {
            return format!("<div class=\"empty-jobs\">{}</div>", EMPTY_JOBS);
        }

        let mut html = String::new();
        for row in &self.rows {
            let _ = write!(
                html,
                "<div class=\"job-item job-{}\" data-id=\"{}\">\
                 <span class=\"job-type\">{}</span>\
                 <span class=\"job-status\">{}</span>\
                 <span class=\"job-started\">{}</span>",
                row.status.as_str(),
                escape_html(&row.id),
                escape_html(&row.job_type),
                row.status.as_str(),
                row.started
            );
            if let Some(duration) = &row.duration {
                let _ = write!(html, "<span class=\"job-duration\">{}</span>", duration);
            }
            if let Some(summary) = &row.summary {
                let _ = write!(html, "<div class=\"job-summary\">{}</div>", escape_html(summary));
            }
            if let Some(error) = &row.error {
                let _ = write!(html, "<div class=\"job-error\">{}</div>", escape_html(error));
            }
            html.push_str("<div class=\"job-actions\">");
            if row.can_stop {
                html.push_str("<button class=\"job-stop\">Stop</button>");
            }
            html.push_str(
                "<button class=\"job-logs\">Logs</button><button class=\"job-delete\">Delete</button></div></div>",
            );
        }
        html
    }
}

/// Contents of the job log viewer
#[derive(Debug, Clone, PartialEq)]
pub enum JobLogPane {
    Lines(Vec<JobLogRow>),
    /// Fetch failed; shown inline in place of the lines
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobLogRow {
    pub timestamp: String,
    pub level: JobLogLevel,
    pub message: String,
}

/// Render a page of job log lines, oldest first
pub fn render_job_log(lines: &[JobLogLine]) -> JobLogPane {
    let mut ordered: Vec<&JobLogLine> = lines.iter().collect();
    ordered.sort_by_key(|line| line.timestamp);

    JobLogPane::Lines(
        ordered
            .into_iter()
            .map(|line| JobLogRow {
                timestamp: human_time(&line.timestamp),
                level: line.log_level,
                message: line.message.clone(),
            })
            .collect(),
    )
}

impl JobLogPane {
    /// Index of the line the viewer scrolls to
    pub fn newest_line(&self) -> Option<usize> {
        match self {
            Self::Lines(rows) => rows.len().checked_sub(1),
            Self::Error(_) => None,
        }
    }

    pub fn to_html(&self) -> String {
        match self {
            Self::Error(message) => format!(
                "<div class=\"job-log-error\">Failed to load logs: {}</div>",
                escape_html(message)
            ),
            Self::Lines(rows) if rows.is_empty() => {
                format!("<div class=\"job-log-empty\">{}</div>", EMPTY_JOB_LOG)
            }
            Self::Lines(rows) => {
                let mut html = String::from("<div class=\"job-log\" data-scroll=\"end\">");
                for row in rows {
                    let _ = write!(
                        html,
                        "<div class=\"job-log-line level-{}\"><span class=\"job-log-time\">{}</span> \
                         <span class=\"job-log-level\">{}</span> <span class=\"job-log-message\">{}</span></div>",
                        row.level.as_str(),
                        row.timestamp,
                        row.level.as_str().to_uppercase(),
                        escape_html(&row.message)
                    );
                }
                html.push_str("</div>");
                html
            }
        }
    }
}
