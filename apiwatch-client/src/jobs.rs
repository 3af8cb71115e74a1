//! Background job API endpoints

use apiwatch_core::domain::job::{JobLogLine, JobRecord};
use apiwatch_core::dto::job::{JobLogsResponse, JobsResponse, MessageResponse};
use reqwest::header::CONTENT_TYPE;

use crate::DashboardClient;
use crate::error::Result;

impl DashboardClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// List every background job the server knows about
    ///
    /// The server does not guarantee any ordering.
    pub async fn list_jobs(&self) -> Result<Vec<JobRecord>> {
        let url = self.url("/api/background-jobs/list");
        let response = self.client.get(&url).send().await?;

        let body: JobsResponse = self.handle_response(response).await?;
        Ok(body.jobs)
    }

    /// Ask a running job to stop
    ///
    /// Cancellation is cooperative, so the job may still be `running` on
    /// the next listing.
    ///
    /// # Returns
    /// The server's acknowledgement, taken from a JSON `message` field or
    /// from a plain-text body
    pub async fn stop_job(&self, job_id: &str) -> Result<Option<String>> {
        let url = self.segments_url(&["api", "background-jobs", job_id, "stop"])?;
        let response = self.client.post(url).send().await?;
        let response = Self::check_status(response).await?;

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        let body = response.text().await?;
        if is_json {
            if let Ok(ack) = serde_json::from_str::<MessageResponse>(&body) {
                return Ok(ack.message);
            }
        }

        let text = body.trim();
        Ok((!text.is_empty()).then(|| text.to_string()))
    }

    /// Permanently delete a job and its log lines
    pub async fn delete_job(&self, job_id: &str) -> Result<()> {
        let url = self.segments_url(&["api", "background-jobs", job_id])?;
        let response = self.client.delete(url).send().await?;

        self.handle_empty_response(response).await
    }

    // =============================================================================
    // Job Logs
    // =============================================================================

    /// Get up to `limit` log lines of a job, oldest first
    pub async fn get_job_logs(&self, job_id: &str, limit: usize) -> Result<Vec<JobLogLine>> {
        let url = self.segments_url(&["api", "background-jobs", job_id, "logs"])?;
        let response = self
            .client
            .get(url)
            .query(&[("limit", limit)])
            .send()
            .await?;

        let body: JobLogsResponse = self.handle_response(response).await?;
        Ok(body.logs)
    }
}
