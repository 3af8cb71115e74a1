//! Background job domain types

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// One background job run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub job_type: String,
    pub status: JobStatus,
    #[serde(with = "crate::timestamp")]
    pub started_at: NaiveDateTime,
    #[serde(default, with = "crate::timestamp::option")]
    pub completed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub result_summary: Option<String>,
}

impl JobRecord {
    /// Only running jobs accept a stop request
    pub fn can_stop(&self) -> bool {
        self.status == JobStatus::Running
    }

    /// Wall time of a finished job
    pub fn duration(&self) -> Option<TimeDelta> {
        if !self.status.is_terminal() {
            return None;
        }
        self.completed_at
            .map(|completed| completed.signed_duration_since(self.started_at))
    }
}

/// Job execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// A single line written by a background job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobLogLine {
    #[serde(with = "crate::timestamp")]
    pub timestamp: NaiveDateTime,
    pub log_level: JobLogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobLogLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl JobLogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Success => "success",
        }
    }
}
