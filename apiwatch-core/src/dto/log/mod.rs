//! Request log DTOs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::log::{Completion, EntryStatus, ExecutionState, FieldMap, LogEntry};
use crate::error::ModelError;

/// A log entry exactly as the server sends it
///
/// Older servers omit `status` (every stored entry was finished) and write
/// captured output to `stdout`; newer ones send `prints`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntryRecord {
    pub id: String,
    #[serde(with = "crate::timestamp")]
    pub timestamp: NaiveDateTime,
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub query_params: FieldMap,
    #[serde(default)]
    pub headers: FieldMap,
    #[serde(default)]
    pub client_ip: Option<String>,
    #[serde(default)]
    pub status: Option<EntryStatus>,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub response_body: Option<String>,
    #[serde(default)]
    pub response_time_ms: Option<f64>,
    #[serde(default)]
    pub prints: Option<String>,
    #[serde(default)]
    pub stdout: Option<String>,
}

impl TryFrom<LogEntryRecord> for LogEntry {
    type Error = ModelError;

    fn try_from(record: LogEntryRecord) -> Result<Self, Self::Error> {
        let prints = record.prints.or(record.stdout).unwrap_or_default();

        let state = match record.status.unwrap_or(EntryStatus::Completed) {
            EntryStatus::Executing => ExecutionState::Executing { prints },
            EntryStatus::Completed => {
                let status_code = record
                    .status_code
                    .ok_or_else(|| ModelError::missing(&record.id, "status_code"))?;
                ExecutionState::Completed(Completion {
                    status_code,
                    response_body: record.response_body.unwrap_or_default(),
                    response_time_ms: record.response_time_ms.unwrap_or(0.0),
                    prints,
                })
            }
        };

        Ok(LogEntry {
            id: record.id,
            timestamp: record.timestamp,
            method: record.method,
            path: record.path,
            query_params: record.query_params,
            headers: record.headers,
            client_ip: record.client_ip,
            state,
        })
    }
}

impl From<&LogEntry> for LogEntryRecord {
    fn from(entry: &LogEntry) -> Self {
        let (status_code, response_body, response_time_ms) = match &entry.state {
            ExecutionState::Executing { .. } => (None, None, None),
            ExecutionState::Completed(done) => (
                Some(done.status_code),
                Some(done.response_body.clone()),
                Some(done.response_time_ms),
            ),
        };

        Self {
            id: entry.id.clone(),
            timestamp: entry.timestamp,
            method: entry.method.clone(),
            path: entry.path.clone(),
            query_params: entry.query_params.clone(),
            headers: entry.headers.clone(),
            client_ip: entry.client_ip.clone(),
            status: Some(entry.status()),
            status_code,
            response_body,
            response_time_ms,
            prints: Some(entry.prints().to_string()),
            stdout: None,
        }
    }
}

/// Body of `GET /api/logs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsResponse {
    pub logs: Vec<LogEntryRecord>,
}

/// Incremental state of an entry that is still executing
///
/// The server resends the whole captured output on every tick, so `prints`
/// is a cumulative buffer rather than a delta.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutingUpdate {
    pub id: String,
    #[serde(default)]
    pub status: Option<EntryStatus>,
    #[serde(default)]
    pub prints: Option<String>,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub response_body: Option<String>,
    #[serde(default)]
    pub response_time_ms: Option<f64>,
}

impl ExecutingUpdate {
    /// Output buffer carried by this update, if any
    pub fn output(&self) -> Option<&str> {
        self.prints.as_deref().or(self.stdout.as_deref())
    }
}

/// Payload of one event on `GET /api/logs/stream`
///
/// Either half may be absent; an event carrying both is a snapshot followed
/// by updates against it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamPayload {
    #[serde(default)]
    pub logs: Option<Vec<LogEntryRecord>>,
    #[serde(default)]
    pub executing: Option<Vec<ExecutingUpdate>>,
}
