//! In-memory repositories for unit tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use apiwatch_client::{ClientError, EventStream, Result};
use apiwatch_core::domain::job::{JobLogLevel, JobLogLine, JobRecord, JobStatus};
use apiwatch_core::domain::log::{Completion, ExecutionState, FieldMap, LogEntry};
use apiwatch_core::timestamp;
use async_trait::async_trait;
use futures::StreamExt;

use crate::repository::{JobRepository, LogRepository};

pub fn executing(id: &str, prints: &str) -> LogEntry {
    LogEntry {
        id: id.to_string(),
        timestamp: timestamp::parse("2024-05-01T10:00:00").unwrap(),
        method: "POST".to_string(),
        path: format!("/run/{id}"),
        query_params: FieldMap::from([("q".to_string(), "1".to_string())]),
        headers: FieldMap::from([("host".to_string(), "localhost".to_string())]),
        client_ip: Some("127.0.0.1".to_string()),
        state: ExecutionState::Executing {
            prints: prints.to_string(),
        },
    }
}

pub fn completed(id: &str, status_code: u16) -> LogEntry {
    LogEntry {
        state: ExecutionState::Completed(Completion {
            status_code,
            response_body: "{\"result\":1}".to_string(),
            response_time_ms: 12.5,
            prints: "done\n".to_string(),
        }),
        ..executing(id, "")
    }
}

pub fn job(id: &str, status: JobStatus, started_at: &str) -> JobRecord {
    JobRecord {
        id: id.to_string(),
        job_type: "import".to_string(),
        status,
        started_at: timestamp::parse(started_at).unwrap(),
        completed_at: None,
        error_message: None,
        result_summary: None,
    }
}

pub fn job_line(at: &str, level: JobLogLevel, message: &str) -> JobLogLine {
    JobLogLine {
        timestamp: timestamp::parse(at).unwrap(),
        log_level: level,
        message: message.to_string(),
    }
}

/// One scripted `open_stream` outcome
enum ScriptedConnection {
    Refused(ClientError),
    Open {
        events: Vec<Result<String>>,
        stay_open: bool,
    },
}

/// Log repository whose stream connections are scripted up front
///
/// Each `open_stream` call consumes one scripted connection. Once the script
/// runs out, connections open and stay silent.
#[derive(Default)]
pub struct FakeLogRepository {
    connections: Mutex<VecDeque<ScriptedConnection>>,
    attempts: AtomicUsize,
    pub logs: Mutex<Vec<LogEntry>>,
    pub fail_clear: Mutex<Option<String>>,
}

impl FakeLogRepository {
    /// A connection that delivers `events` and then stays open, or is refused
    pub fn push_connection(&self, connection: Result<Vec<String>>) {
        let scripted = match connection {
            Ok(events) => ScriptedConnection::Open {
                events: events.into_iter().map(Ok).collect(),
                stay_open: true,
            },
            Err(e) => ScriptedConnection::Refused(e),
        };
        self.connections.lock().unwrap().push_back(scripted);
    }

    /// A connection the server closes after delivering `events`
    pub fn push_ending_connection(&self, events: Vec<String>) {
        self.connections.lock().unwrap().push_back(ScriptedConnection::Open {
            events: events.into_iter().map(Ok).collect(),
            stay_open: false,
        });
    }

    /// A connection that delivers `events`, then fails with `error` without
    /// closing
    pub fn push_failing_connection(&self, events: Vec<String>, error: ClientError) {
        let mut events: Vec<Result<String>> = events.into_iter().map(Ok).collect();
        events.push(Err(error));
        self.connections.lock().unwrap().push_back(ScriptedConnection::Open {
            events,
            stay_open: true,
        });
    }

    pub fn connect_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogRepository for FakeLogRepository {
    async fn list_logs(&self, limit: usize) -> Result<Vec<LogEntry>> {
        Ok(self.logs.lock().unwrap().iter().take(limit).cloned().collect())
    }

    async fn clear_logs(&self) -> Result<()> {
        if let Some(message) = self.fail_clear.lock().unwrap().clone() {
            return Err(ClientError::api_error(500, message));
        }
        self.logs.lock().unwrap().clear();
        Ok(())
    }

    async fn open_stream(&self) -> Result<EventStream> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let next = self.connections.lock().unwrap().pop_front();
        match next {
            Some(ScriptedConnection::Refused(e)) => Err(e),
            Some(ScriptedConnection::Open { events, stay_open: true }) => {
                Ok(futures::stream::iter(events).chain(futures::stream::pending()).boxed())
            }
            Some(ScriptedConnection::Open { events, stay_open: false }) => {
                Ok(futures::stream::iter(events).boxed())
            }
            None => Ok(futures::stream::pending().boxed()),
        }
    }
}

/// Job repository backed by a mutable job list
#[derive(Default)]
pub struct FakeJobRepository {
    pub jobs: Mutex<Vec<JobRecord>>,
    pub lines: Mutex<Vec<JobLogLine>>,
    pub list_delay: Mutex<Option<Duration>>,
    pub logs_delay: Mutex<Option<Duration>>,
    pub fail_logs: Mutex<Option<String>>,
    pub fail_stop: Mutex<Option<String>>,
    pub stopped: Mutex<Vec<String>>,
    list_calls: AtomicUsize,
    log_calls: AtomicUsize,
}

impl FakeJobRepository {
    pub fn with_jobs(jobs: Vec<JobRecord>) -> Self {
        let repo = Self::default();
        *repo.jobs.lock().unwrap() = jobs;
        repo
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn log_calls(&self) -> usize {
        self.log_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobRepository for FakeJobRepository {
    async fn list_jobs(&self) -> Result<Vec<JobRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.list_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.jobs.lock().unwrap().clone())
    }

    async fn stop_job(&self, job_id: &str) -> Result<Option<String>> {
        if let Some(message) = self.fail_stop.lock().unwrap().clone() {
            return Err(ClientError::api_error(500, message));
        }
        self.stopped.lock().unwrap().push(job_id.to_string());
        Ok(Some(format!("Stop requested for {job_id}")))
    }

    async fn delete_job(&self, job_id: &str) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let before = jobs.len();
        jobs.retain(|job| job.id != job_id);
        if jobs.len() == before {
            return Err(ClientError::api_error(404, "Job not found"));
        }
        Ok(())
    }

    async fn job_logs(&self, _job_id: &str, limit: usize) -> Result<Vec<JobLogLine>> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.logs_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = self.fail_logs.lock().unwrap().clone() {
            return Err(ClientError::api_error(500, message));
        }
        Ok(self.lines.lock().unwrap().iter().take(limit).cloned().collect())
    }
}
