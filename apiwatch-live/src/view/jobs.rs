//! Background jobs view

use std::sync::Arc;

use anyhow::Context;
use apiwatch_core::domain::job::JobRecord;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::Notice;
use crate::config::Config;
use crate::render::{JobListView, render_jobs};
use crate::repository::JobRepository;
use crate::scheduler::{Poller, PollerHandle};
use crate::viewer::JobLogViewer;

/// Held job list, newest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobBoard {
    jobs: Vec<JobRecord>,
}

impl JobBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held list with a fresh fetch
    pub fn replace(&mut self, mut jobs: Vec<JobRecord>) {
        jobs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        self.jobs = jobs;
    }

    pub fn jobs(&self) -> &[JobRecord] {
        &self.jobs
    }

    pub fn get(&self, id: &str) -> Option<&JobRecord> {
        self.jobs.iter().find(|job| job.id == id)
    }

    pub fn render(&self) -> JobListView {
        render_jobs(&self.jobs)
    }
}

pub struct JobsView<R: ?Sized> {
    repository: Arc<R>,
    board: JobBoard,
    rx: mpsc::Receiver<Vec<JobRecord>>,
    poller: Option<PollerHandle>,
    config: Config,
}

impl<R: JobRepository + ?Sized + 'static> JobsView<R> {
    /// Opens the view and starts polling the job list
    pub fn open(repository: Arc<R>, config: &Config) -> Self {
        let (tx, rx) = mpsc::channel(4);
        let source = Arc::clone(&repository);
        let poller = Poller::new("job list", config.poll_interval, move || {
            let repository = Arc::clone(&source);
            async move {
                repository
                    .list_jobs()
                    .await
                    .context("Failed to fetch job list")
            }
        })
        .spawn(tx);
        info!("Opened jobs view");

        Self {
            repository,
            board: JobBoard::new(),
            rx,
            poller: Some(poller),
            config: config.clone(),
        }
    }

    /// Waits for the next poll result and re-renders
    ///
    /// Returns `None` once the view is closed.
    pub async fn next_frame(&mut self) -> Option<JobListView> {
        self.poller.as_ref()?;
        let jobs = self.rx.recv().await?;
        Some(self.apply(jobs))
    }

    /// Fetches the job list now and applies it, without waiting for a tick
    pub async fn sync(&mut self) -> apiwatch_client::Result<JobListView> {
        let jobs = self.repository.list_jobs().await?;
        Ok(self.apply(jobs))
    }

    /// Requests cooperative cancellation of a running job
    pub async fn stop(&mut self, job_id: &str) -> Notice {
        match self.board.get(job_id) {
            Some(job) if job.can_stop() => {}
            Some(job) => {
                return Notice::error(format!(
                    "Job {} is {} and cannot be stopped",
                    job_id,
                    job.status.as_str()
                ));
            }
            None => return Notice::error(format!("Job {} not found", job_id)),
        }

        match self.repository.stop_job(job_id).await {
            Ok(message) => {
                info!("Stop requested for job {}", job_id);
                self.refresh();
                Notice::success(message.unwrap_or_else(|| format!("Stop requested for job {}", job_id)))
            }
            Err(e) => {
                warn!("Failed to stop job {}: {}", job_id, e);
                Notice::error(format!("Failed to stop job: {}", e.user_message()))
            }
        }
    }

    /// Permanently removes a job, whatever its state
    pub async fn delete(&mut self, job_id: &str) -> Notice {
        match self.repository.delete_job(job_id).await {
            Ok(()) => {
                info!("Deleted job {}", job_id);
                self.refresh();
                Notice::success(format!("Job {} deleted", job_id))
            }
            Err(e) => {
                warn!("Failed to delete job {}: {}", job_id, e);
                Notice::error(format!("Failed to delete job: {}", e.user_message()))
            }
        }
    }

    /// Opens a log viewer for one job
    pub fn open_viewer(&self, job_id: &str, auto_refresh: bool) -> JobLogViewer<R> {
        JobLogViewer::open(
            Arc::clone(&self.repository),
            job_id,
            self.config.job_log_limit,
            auto_refresh.then_some(self.config.refresh_interval),
        )
    }
}

impl<R: ?Sized> JobsView<R> {
    /// Replaces the held list wholesale
    pub fn apply(&mut self, jobs: Vec<JobRecord>) -> JobListView {
        debug!("Replacing job list with {} jobs", jobs.len());
        self.board.replace(jobs);
        self.board.render()
    }

    pub fn board(&self) -> &JobBoard {
        &self.board
    }

    pub fn render(&self) -> JobListView {
        self.board.render()
    }

    pub fn is_open(&self) -> bool {
        self.poller.is_some()
    }

    /// Stops polling
    pub fn close(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.stop();
            self.rx.close();
            info!("Closed jobs view");
        }
    }

    fn refresh(&self) {
        if let Some(poller) = &self.poller {
            poller.refresh();
        }
    }
}
