//! Stream client
//!
//! Owns the push connection to the log stream, reconnects after a fixed
//! delay, and forwards classified messages to the owning view.

use std::sync::Arc;
use std::time::Duration;

use apiwatch_client::entries_from_records;
use apiwatch_core::domain::log::LogEntry;
use apiwatch_core::dto::log::{ExecutingUpdate, StreamPayload};
use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use super::connection::{Connection, ConnectionState};
use crate::repository::LogRepository;

/// A classified stream event
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// Authoritative replacement of the held entries
    Snapshot(Vec<LogEntry>),
    /// Cumulative state of entries still executing
    Updates(Vec<ExecutingUpdate>),
}

/// Classify one event payload
///
/// A payload may carry both halves; the snapshot is yielded first so the
/// updates apply to it. Malformed payloads yield nothing.
pub fn classify(payload: &str) -> Vec<StreamMessage> {
    let payload: StreamPayload = match serde_json::from_str(payload) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Dropping malformed stream message: {}", e);
            return Vec::new();
        }
    };

    let mut messages = Vec::with_capacity(2);
    if let Some(records) = payload.logs {
        messages.push(StreamMessage::Snapshot(entries_from_records(records)));
    }
    if let Some(updates) = payload.executing {
        if !updates.is_empty() {
            messages.push(StreamMessage::Updates(updates));
        }
    }
    messages
}

/// Drives one logical connection for the lifetime of a view
pub struct StreamClient<R: ?Sized> {
    repository: Arc<R>,
    connection: Connection,
    state_tx: watch::Sender<ConnectionState>,
}

impl<R: LogRepository + ?Sized + 'static> StreamClient<R> {
    pub fn new(repository: Arc<R>, reconnect_delay: Duration) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            repository,
            connection: Connection::new(reconnect_delay),
            state_tx,
        }
    }

    /// Start the connection loop, delivering messages to `tx`
    ///
    /// The loop ends when the handle is closed or dropped, or when the
    /// receiving side of `tx` goes away.
    pub fn spawn(self, tx: mpsc::Sender<StreamMessage>) -> StreamHandle {
        let state = self.state_tx.subscribe();
        let task = tokio::spawn(self.run(tx));
        StreamHandle {
            task: Some(task),
            state,
        }
    }

    async fn run(mut self, tx: mpsc::Sender<StreamMessage>) {
        loop {
            if let Some(due) = self.connection.reconnect_due() {
                time::sleep_until(due).await;
                self.connection.timer_fired(Instant::now());
            }

            if !self.connection.begin_connect() {
                debug!("Stream connection closed, leaving connect loop");
                return;
            }
            self.publish();

            match self.repository.open_stream().await {
                Ok(mut events) => {
                    self.connection.opened();
                    self.publish();
                    info!("Log stream open");

                    while let Some(event) = events.next().await {
                        match event {
                            Ok(payload) => {
                                for message in classify(&payload) {
                                    if tx.send(message).await.is_err() {
                                        debug!("Stream subscriber gone, closing connection");
                                        self.connection.close();
                                        self.publish();
                                        return;
                                    }
                                }
                            }
                            Err(e) => {
                                warn!("Log stream error: {}", e);
                                break;
                            }
                        }
                    }
                    warn!("Log stream closed");
                }
                Err(e) => warn!("Failed to open log stream: {}", e),
            }

            if let Some(due) = self.connection.failed(Instant::now()) {
                debug!(
                    "Reconnecting in {:?}",
                    due.saturating_duration_since(Instant::now())
                );
            }
            self.publish();
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.connection.state());
    }
}

/// Handle to a running stream client
///
/// Closing (or dropping) the handle aborts the connection task, which drops
/// the open response body and any pending reconnect sleep with it.
pub struct StreamHandle {
    task: Option<JoinHandle<()>>,
    state: watch::Receiver<ConnectionState>,
}

impl StreamHandle {
    pub fn state(&self) -> ConnectionState {
        if self.task.is_none() {
            return ConnectionState::Disconnected;
        }
        *self.state.borrow()
    }

    /// Waits for the next connection state change
    pub async fn changed(&mut self) -> Option<ConnectionState> {
        self.state.changed().await.ok()?;
        Some(*self.state.borrow_and_update())
    }

    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.task.is_none()
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.close();
    }
}
