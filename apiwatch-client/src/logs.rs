//! Request log API endpoints

use std::collections::VecDeque;
use std::pin::Pin;

use apiwatch_core::domain::log::LogEntry;
use apiwatch_core::dto::log::{LogEntryRecord, LogsResponse};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::ACCEPT;
use tracing::{debug, warn};

use crate::DashboardClient;
use crate::error::{ClientError, Result};
use crate::sse::SseDecoder;

/// Raw event payloads from the live log stream, in arrival order
///
/// The stream ends when the server closes the connection; a transport
/// failure yields one `Err` and then ends.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Convert wire records, dropping the ones that violate entry invariants
pub fn entries_from_records(records: Vec<LogEntryRecord>) -> Vec<LogEntry> {
    records
        .into_iter()
        .filter_map(|record| match LogEntry::try_from(record) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Dropping malformed log entry: {}", e);
                None
            }
        })
        .collect()
}

impl DashboardClient {
    // =============================================================================
    // Request Logs
    // =============================================================================

    /// List the most recent log entries, newest first
    ///
    /// # Arguments
    /// * `limit` - Maximum number of entries the server should return
    pub async fn list_logs(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let url = self.url("/api/logs");
        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit)])
            .send()
            .await?;

        let body: LogsResponse = self.handle_response(response).await?;
        Ok(entries_from_records(body.logs))
    }

    /// Delete every stored log entry
    ///
    /// Clearing an already empty log succeeds.
    pub async fn clear_logs(&self) -> Result<()> {
        let url = self.url("/api/logs");
        let response = self.client.delete(&url).send().await?;

        self.handle_empty_response(response).await
    }

    /// Open the live log stream
    ///
    /// Returns once the server has accepted the connection. Each item of the
    /// returned stream is the `data` payload of one server-sent event.
    pub async fn open_log_stream(&self) -> Result<EventStream> {
        let url = self.url("/api/logs/stream");
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        debug!("Log stream connected to {}", url);

        let state = StreamState {
            body: response.bytes_stream().boxed(),
            decoder: SseDecoder::new(),
            ready: VecDeque::new(),
            finished: false,
        };

        Ok(futures::stream::unfold(state, next_event).boxed())
    }
}

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

struct StreamState {
    body: ByteStream,
    decoder: SseDecoder,
    ready: VecDeque<String>,
    finished: bool,
}

async fn next_event(mut state: StreamState) -> Option<(Result<String>, StreamState)> {
    loop {
        if let Some(event) = state.ready.pop_front() {
            return Some((Ok(event), state));
        }
        if state.finished {
            return None;
        }

        match state.body.next().await {
            Some(Ok(chunk)) => state.ready.extend(state.decoder.feed(&chunk)),
            Some(Err(e)) => {
                state.finished = true;
                return Some((Err(ClientError::StreamError(e.to_string())), state));
            }
            None => state.finished = true,
        }
    }
}
