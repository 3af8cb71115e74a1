//! Jobs repository
//!
//! Listing, stopping and deleting background jobs, and reading their logs.

use apiwatch_client::{DashboardClient, Result};
use apiwatch_core::domain::job::{JobLogLine, JobRecord};
use async_trait::async_trait;

/// Repository trait for background-job operations
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Fetches the complete job list
    async fn list_jobs(&self) -> Result<Vec<JobRecord>>;

    /// Requests cooperative cancellation of a running job
    ///
    /// # Returns
    /// The server's acknowledgement text, if any
    async fn stop_job(&self, job_id: &str) -> Result<Option<String>>;

    /// Permanently removes a job and its log lines
    async fn delete_job(&self, job_id: &str) -> Result<()>;

    /// Fetches up to `limit` log lines of a job, oldest first
    async fn job_logs(&self, job_id: &str, limit: usize) -> Result<Vec<JobLogLine>>;
}

#[async_trait]
impl JobRepository for DashboardClient {
    async fn list_jobs(&self) -> Result<Vec<JobRecord>> {
        DashboardClient::list_jobs(self).await
    }

    async fn stop_job(&self, job_id: &str) -> Result<Option<String>> {
        DashboardClient::stop_job(self, job_id).await
    }

    async fn delete_job(&self, job_id: &str) -> Result<()> {
        DashboardClient::delete_job(self, job_id).await
    }

    async fn job_logs(&self, job_id: &str, limit: usize) -> Result<Vec<JobLogLine>> {
        self.get_job_logs(job_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::Config;
    use crate::render::JobLogPane;
    use crate::view::JobsView;

    #[tokio::test]
    async fn test_jobs_view_over_http() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/background-jobs/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jobs": [
                    {
                        "id": "j1",
                        "job_type": "import",
                        "status": "completed",
                        "started_at": "2024-05-01T09:00:00",
                        "completed_at": "2024-05-01T09:01:00",
                        "result_summary": "ok"
                    },
                    {
                        "id": "j2",
                        "job_type": "sync",
                        "status": "running",
                        "started_at": "2024-05-01T10:00:00"
                    }
                ]
            })))
            .mount(&mock_server)
            .await;

        let client = Arc::new(DashboardClient::new(mock_server.uri()));
        let mut view = JobsView::open(client, &Config::new(mock_server.uri()));
        let frame = view.next_frame().await.unwrap();

        assert_eq!(frame.rows[0].id, "j2");
        assert!(frame.rows[0].can_stop);
        assert_eq!(frame.rows[1].summary.as_deref(), Some("ok"));
        assert_eq!(frame.rows[1].duration.as_deref(), Some("60s"));
    }

    #[tokio::test]
    async fn test_viewer_over_http_shows_error_detail() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/background-jobs/gone/logs"))
            .and(query_param("limit", "10000"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Job not found"})))
            .mount(&mock_server)
            .await;

        let client = Arc::new(DashboardClient::new(mock_server.uri()));
        let view = JobsView::open(Arc::clone(&client), &Config::new(mock_server.uri()));
        let mut viewer = view.open_viewer("gone", false);

        assert_eq!(
            viewer.next_pane().await,
            Some(JobLogPane::Error("Job not found".to_string()))
        );
    }
}
