//! Request log domain types

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered key/value mapping captured from a request
pub type FieldMap = IndexMap<String, String>;

/// One request served by a dynamically defined endpoint
///
/// Request descriptors are fixed when the entry is created. Everything that
/// evolves while the handler runs lives in [`ExecutionState`].
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: NaiveDateTime,
    pub method: String,
    pub path: String,
    pub query_params: FieldMap,
    pub headers: FieldMap,
    pub client_ip: Option<String>,
    pub state: ExecutionState,
}

impl LogEntry {
    pub fn status(&self) -> EntryStatus {
        self.state.status()
    }

    pub fn prints(&self) -> &str {
        self.state.prints()
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, ExecutionState::Completed(_))
    }
}

/// Lifecycle of a request execution
///
/// `Executing` may be replaced by `Completed` exactly once. A completed
/// entry is never mutated again.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionState {
    Executing { prints: String },
    Completed(Completion),
}

impl ExecutionState {
    pub fn status(&self) -> EntryStatus {
        match self {
            Self::Executing { .. } => EntryStatus::Executing,
            Self::Completed(_) => EntryStatus::Completed,
        }
    }

    pub fn prints(&self) -> &str {
        match self {
            Self::Executing { prints } => prints,
            Self::Completed(completion) => &completion.prints,
        }
    }
}

/// Terminal fields of a finished request
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub status_code: u16,
    pub response_body: String,
    pub response_time_ms: f64,
    pub prints: String,
}

impl Completion {
    pub fn status_class(&self) -> StatusClass {
        StatusClass::from_code(self.status_code)
    }
}

/// Wire status of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Executing,
    Completed,
}

/// Coarse response class used for badges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    ClientError,
    ServerError,
}

impl StatusClass {
    /// Anything below 400 counts as success, matching the dashboard badges
    pub fn from_code(code: u16) -> Self {
        match code {
            500.. => Self::ServerError,
            400..=499 => Self::ClientError,
            _ => Self::Success,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "2xx",
            Self::ClientError => "4xx",
            Self::ServerError => "5xx",
        }
    }
}
