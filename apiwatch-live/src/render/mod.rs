//! Snapshot rendering
//!
//! Pure functions from held state to display structures. Each structure can
//! be turned into markup with `to_html`; every piece of request, response or
//! job-derived text is escaped on the way.

mod escape;
pub mod jobs;
pub mod logs;

pub use escape::escape_html;
pub use jobs::{JobListView, JobLogPane, render_job_log, render_jobs};
pub use logs::{LogListView, render_logs};

use chrono::NaiveDateTime;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn human_time(at: &NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}
