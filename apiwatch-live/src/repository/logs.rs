//! Logs repository
//!
//! Access to stored request logs and the live log stream.

use apiwatch_client::{DashboardClient, EventStream, Result};
use apiwatch_core::domain::log::LogEntry;
use async_trait::async_trait;

/// Repository trait for request-log operations
#[async_trait]
pub trait LogRepository: Send + Sync {
    /// Fetches the most recent entries, newest first
    async fn list_logs(&self, limit: usize) -> Result<Vec<LogEntry>>;

    /// Deletes all stored entries
    async fn clear_logs(&self) -> Result<()>;

    /// Opens the push connection carrying snapshots and executing updates
    async fn open_stream(&self) -> Result<EventStream>;
}

#[async_trait]
impl LogRepository for DashboardClient {
    async fn list_logs(&self, limit: usize) -> Result<Vec<LogEntry>> {
        DashboardClient::list_logs(self, limit).await
    }

    async fn clear_logs(&self) -> Result<()> {
        DashboardClient::clear_logs(self).await
    }

    async fn open_stream(&self) -> Result<EventStream> {
        self.open_log_stream().await
    }
}
