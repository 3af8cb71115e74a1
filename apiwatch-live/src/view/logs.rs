//! Request log view
//!
//! Holds the reconciled entry set and the expand flags, fed either by the
//! push stream or, for servers without one, by polling the list endpoint.

use std::sync::Arc;

use anyhow::Context;
use apiwatch_core::domain::log::LogEntry;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::Notice;
use crate::config::Config;
use crate::reconcile::{ExpandState, LogSet, UpdateOutcome};
use crate::render::{LogListView, render_logs};
use crate::repository::LogRepository;
use crate::scheduler::{Poller, PollerHandle};
use crate::stream::{ConnectionState, StreamClient, StreamHandle, StreamMessage};

const MESSAGE_BUFFER: usize = 32;

/// A re-render produced by one applied message
#[derive(Debug, Clone, PartialEq)]
pub struct LogFrame {
    pub view: LogListView,
    /// Expanded entries whose output grew and should scroll to the end
    pub autoscroll: Vec<String>,
}

enum Feed {
    Stream(StreamHandle),
    Polling(PollerHandle),
}

pub struct LogsView<R: ?Sized> {
    repository: Arc<R>,
    limit: usize,
    logs: LogSet,
    expanded: ExpandState,
    rx: mpsc::Receiver<StreamMessage>,
    feed: Option<Feed>,
}

impl<R: LogRepository + ?Sized + 'static> LogsView<R> {
    /// Opens the view on the push stream
    pub fn open(repository: Arc<R>, config: &Config) -> Self {
        let (tx, rx) = mpsc::channel(MESSAGE_BUFFER);
        let handle = StreamClient::new(Arc::clone(&repository), config.reconnect_delay).spawn(tx);
        info!("Opened live log view");
        Self::with_feed(repository, config.log_limit, rx, Feed::Stream(handle))
    }

    /// Opens the view on a fixed-interval refetch of the log list
    pub fn open_polling(repository: Arc<R>, config: &Config) -> Self {
        let (tx, rx) = mpsc::channel(MESSAGE_BUFFER);
        let limit = config.log_limit;
        let source = Arc::clone(&repository);
        let handle = Poller::new("log list", config.refresh_interval, move || {
            let repository = Arc::clone(&source);
            async move {
                let entries = repository
                    .list_logs(limit)
                    .await
                    .context("Failed to fetch logs")?;
                Ok(StreamMessage::Snapshot(entries))
            }
        })
        .spawn(tx);
        info!("Opened polled log view");
        Self::with_feed(repository, limit, rx, Feed::Polling(handle))
    }

    fn with_feed(
        repository: Arc<R>,
        limit: usize,
        rx: mpsc::Receiver<StreamMessage>,
        feed: Feed,
    ) -> Self {
        Self {
            repository,
            limit,
            logs: LogSet::new(),
            expanded: ExpandState::new(),
            rx,
            feed: Some(feed),
        }
    }

    /// Waits for the next message that changes the display
    ///
    /// Returns `None` once the view is closed.
    pub async fn next_frame(&mut self) -> Option<LogFrame> {
        if self.feed.is_none() {
            return None;
        }
        while let Some(message) = self.rx.recv().await {
            if let Some(frame) = self.apply(message) {
                return Some(frame);
            }
        }
        None
    }

    /// Clears every stored entry on the server
    ///
    /// On success the list is refetched, which leaves the empty state. On
    /// failure nothing changes so the action can be retried.
    pub async fn clear_logs(&mut self) -> Notice {
        if let Err(e) = self.repository.clear_logs().await {
            warn!("Failed to clear logs: {}", e);
            return Notice::error(format!("Failed to clear logs: {}", e.user_message()));
        }

        let entries = match self.repository.list_logs(self.limit).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to refetch logs after clearing: {}", e);
                Vec::new()
            }
        };
        self.apply(StreamMessage::Snapshot(entries));
        info!("Logs cleared");
        Notice::success("Logs cleared")
    }
}

impl<R: ?Sized> LogsView<R> {
    /// Applies one message, returning a frame if the display changed
    pub fn apply(&mut self, message: StreamMessage) -> Option<LogFrame> {
        match message {
            StreamMessage::Snapshot(entries) => {
                debug!("Applying snapshot of {} entries", entries.len());
                self.logs.replace(entries);
                self.expanded.retain_known(&self.logs);
                Some(self.frame(Vec::new()))
            }
            StreamMessage::Updates(updates) => {
                let mut applied = false;
                let mut autoscroll = Vec::new();
                for update in &updates {
                    if let UpdateOutcome::Applied { output_changed, .. } = self.logs.apply(update) {
                        applied = true;
                        if output_changed && self.expanded.is_expanded(&update.id) {
                            autoscroll.push(update.id.clone());
                        }
                    }
                }
                applied.then(|| self.frame(autoscroll))
            }
        }
    }

    /// Expands or collapses an entry, returning whether it is now expanded
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.logs.get(id).is_none() {
            debug!("Ignoring toggle for unknown entry {}", id);
            return false;
        }
        self.expanded.toggle(id)
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.is_expanded(id)
    }

    pub fn render(&self) -> LogListView {
        render_logs(self.logs.entries(), &self.expanded)
    }

    pub fn entries(&self) -> &[LogEntry] {
        self.logs.entries()
    }

    /// State of the push connection; `None` when polling or closed
    pub fn connection_state(&self) -> Option<ConnectionState> {
        match &self.feed {
            Some(Feed::Stream(handle)) => Some(handle.state()),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.feed.is_some()
    }

    /// Closes the connection or stops polling, cancelling any pending
    /// reconnect timer
    pub fn close(&mut self) {
        match self.feed.take() {
            Some(Feed::Stream(mut handle)) => handle.close(),
            Some(Feed::Polling(mut handle)) => handle.stop(),
            None => return,
        }
        self.rx.close();
        info!("Closed log view");
    }

    fn frame(&self, autoscroll: Vec<String>) -> LogFrame {
        LogFrame {
            view: self.render(),
            autoscroll,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::logs::EMPTY_LOGS;
    use crate::testing::{FakeLogRepository, completed, executing};
    use apiwatch_core::domain::log::EntryStatus;
    use apiwatch_core::dto::log::ExecutingUpdate;
    use std::time::Duration;

    fn update(id: &str, prints: &str) -> ExecutingUpdate {
        ExecutingUpdate {
            id: id.to_string(),
            status: Some(EntryStatus::Executing),
            prints: Some(prints.to_string()),
            ..Default::default()
        }
    }

    fn idle_view() -> (Arc<FakeLogRepository>, LogsView<FakeLogRepository>) {
        let repo = Arc::new(FakeLogRepository::default());
        let view = LogsView::open(Arc::clone(&repo), &Config::default());
        (repo, view)
    }

    #[tokio::test]
    async fn test_partial_update_grows_prints() {
        let (_repo, mut view) = idle_view();
        view.apply(StreamMessage::Snapshot(vec![executing("a", "hi")]));

        let frame = view
            .apply(StreamMessage::Updates(vec![update("a", "hi world")]))
            .unwrap();

        assert_eq!(view.entries()[0].prints(), "hi world");
        assert_eq!(view.entries()[0].status(), EntryStatus::Executing);
        assert!(frame.autoscroll.is_empty());
    }

    #[tokio::test]
    async fn test_expanded_entry_autoscrolls() {
        let (_repo, mut view) = idle_view();
        view.apply(StreamMessage::Snapshot(vec![executing("a", "hi"), executing("b", "")]));
        assert!(view.toggle("a"));

        let frame = view
            .apply(StreamMessage::Updates(vec![update("a", "hi!"), update("b", "x")]))
            .unwrap();

        assert_eq!(frame.autoscroll, vec!["a".to_string()]);
        assert!(frame.view.rows[0].expanded);
    }

    #[tokio::test]
    async fn test_no_frame_when_nothing_applies() {
        let (_repo, mut view) = idle_view();
        view.apply(StreamMessage::Snapshot(vec![completed("a", 200)]));

        assert!(view.apply(StreamMessage::Updates(vec![update("zzz", "x")])).is_none());
        assert!(view.apply(StreamMessage::Updates(vec![update("a", "late")])).is_none());
    }

    #[tokio::test]
    async fn test_snapshot_prunes_expand_flags() {
        let (_repo, mut view) = idle_view();
        view.apply(StreamMessage::Snapshot(vec![executing("a", ""), executing("b", "")]));
        view.toggle("a");
        view.toggle("b");

        view.apply(StreamMessage::Snapshot(vec![completed("b", 200)]));
        view.apply(StreamMessage::Snapshot(vec![completed("a", 200), completed("b", 200)]));

        let rows = view.render().rows;
        assert!(!rows[0].expanded);
        assert!(rows[1].expanded);
    }

    #[tokio::test]
    async fn test_toggle_unknown_entry_is_ignored() {
        let (_repo, mut view) = idle_view();
        assert!(!view.toggle("missing"));
    }

    #[tokio::test]
    async fn test_clear_then_empty_placeholder() {
        let (repo, mut view) = idle_view();
        *repo.logs.lock().unwrap() = vec![completed("a", 200)];
        view.apply(StreamMessage::Snapshot(vec![completed("a", 200)]));

        let notice = view.clear_logs().await;

        assert!(!notice.is_error());
        assert!(view.entries().is_empty());
        assert!(view.render().to_html().contains(EMPTY_LOGS));
    }

    #[tokio::test]
    async fn test_failed_clear_leaves_state() {
        let (repo, mut view) = idle_view();
        *repo.fail_clear.lock().unwrap() = Some("disk full".to_string());
        view.apply(StreamMessage::Snapshot(vec![completed("a", 200)]));

        let notice = view.clear_logs().await;

        assert!(notice.is_error());
        assert!(notice.message.contains("disk full"));
        assert_eq!(view.entries().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_from_stream() {
        let repo = Arc::new(FakeLogRepository::default());
        repo.push_connection(Ok(vec![
            r#"{"logs":[{"id":"a","timestamp":"2024-05-01T10:00:00","method":"GET","path":"/x","status":"executing","prints":"hi"}]}"#.to_string(),
            r#"{"executing":[{"id":"a","status":"executing","prints":"hi world"}]}"#.to_string(),
        ]));
        let mut view = LogsView::open(Arc::clone(&repo), &Config::default());

        let first = view.next_frame().await.unwrap();
        assert_eq!(first.view.rows.len(), 1);
        assert_eq!(view.connection_state(), Some(ConnectionState::Open));

        view.next_frame().await.unwrap();
        assert_eq!(view.entries()[0].prints(), "hi world");

        view.close();
        assert!(!view.is_open());
        assert_eq!(view.connection_state(), None);
        assert!(view.next_frame().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_polled_view_refreshes() {
        let repo = Arc::new(FakeLogRepository::default());
        *repo.logs.lock().unwrap() = vec![executing("a", "")];
        let config = Config {
            refresh_interval: Duration::from_secs(5),
            ..Config::default()
        };
        let mut view = LogsView::open_polling(Arc::clone(&repo), &config);

        assert_eq!(view.next_frame().await.unwrap().view.rows.len(), 1);

        repo.logs.lock().unwrap().push(completed("b", 201));
        assert_eq!(view.next_frame().await.unwrap().view.rows.len(), 2);
        assert_eq!(view.connection_state(), None);
    }
}
