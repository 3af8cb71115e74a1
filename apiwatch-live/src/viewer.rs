//! Job log viewer
//!
//! A transient pane showing one job's log history. Every fetch replaces the
//! whole pane. Fetches deliver into a channel whose receiving end is the
//! pane's rendering target; closing the viewer drops that end, so a response
//! that arrives afterwards has nowhere to go and is discarded.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::render::{JobLogPane, render_job_log};
use crate::repository::JobRepository;
use crate::scheduler::{Poller, PollerHandle};

const PANE_BUFFER: usize = 4;

pub struct JobLogViewer<R: ?Sized> {
    job_id: String,
    repository: Arc<R>,
    limit: usize,
    tx: Option<mpsc::Sender<JobLogPane>>,
    target: Option<mpsc::Receiver<JobLogPane>>,
    auto_refresh: Option<PollerHandle>,
}

impl<R: JobRepository + ?Sized + 'static> JobLogViewer<R> {
    /// Opens the viewer and starts the first fetch
    ///
    /// With `auto_refresh` set the pane is also refetched on that interval
    /// until the viewer closes.
    pub fn open(
        repository: Arc<R>,
        job_id: impl Into<String>,
        limit: usize,
        auto_refresh: Option<Duration>,
    ) -> Self {
        let job_id = job_id.into();
        let (tx, target) = mpsc::channel(PANE_BUFFER);
        info!("Opening log viewer for job {}", job_id);

        let auto_refresh = auto_refresh.map(|interval| {
            let repository = Arc::clone(&repository);
            let job_id = job_id.clone();
            Poller::new("job log", interval, move || {
                let repository = Arc::clone(&repository);
                let job_id = job_id.clone();
                async move { anyhow::Ok(fetch_pane(&*repository, &job_id, limit).await) }
            })
            .spawn(tx.clone())
        });

        let viewer = Self {
            job_id,
            repository,
            limit,
            tx: Some(tx),
            target: Some(target),
            auto_refresh,
        };
        if viewer.auto_refresh.is_none() {
            viewer.refresh();
        }
        viewer
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    /// Fetches the log page again
    ///
    /// Earlier fetches are not cancelled. The returned task resolves to
    /// whether its page reached the pane.
    pub fn refresh(&self) -> JoinHandle<bool> {
        let Some(tx) = self.tx.clone() else {
            return tokio::spawn(async { false });
        };
        let repository = Arc::clone(&self.repository);
        let job_id = self.job_id.clone();
        let limit = self.limit;

        tokio::spawn(async move {
            let pane = fetch_pane(&*repository, &job_id, limit).await;
            if tx.send(pane).await.is_err() {
                debug!("Viewer for job {} closed, discarding log page", job_id);
                return false;
            }
            true
        })
    }

    /// Waits for the next page to render
    ///
    /// Returns `None` once the viewer is closed.
    pub async fn next_pane(&mut self) -> Option<JobLogPane> {
        self.target.as_mut()?.recv().await
    }

    /// Tears the viewer down, stopping auto-refresh and dropping the pane
    pub fn close(&mut self) {
        if let Some(mut poller) = self.auto_refresh.take() {
            poller.stop();
        }
        self.tx = None;
        if self.target.take().is_some() {
            info!("Closed log viewer for job {}", self.job_id);
        }
    }
}

async fn fetch_pane<R: JobRepository + ?Sized>(
    repository: &R,
    job_id: &str,
    limit: usize,
) -> JobLogPane {
    match repository.job_logs(job_id, limit).await {
        Ok(lines) => {
            debug!("Fetched {} log lines for job {}", lines.len(), job_id);
            render_job_log(&lines)
        }
        Err(e) => {
            warn!("Failed to fetch logs for job {}: {}", job_id, e);
            JobLogPane::Error(e.user_message())
        }
    }
}
