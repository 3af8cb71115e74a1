//! apiwatch HTTP Client
//!
//! A small, type-safe HTTP client for the dashboard endpoints of the API
//! management server: request logs, the live log stream and background jobs.
//!
//! # Example
//!
//! ```no_run
//! use apiwatch_client::DashboardClient;
//!
//! #[tokio::main]
//! async fn main() -> apiwatch_client::Result<()> {
//!     let client = DashboardClient::new("http://localhost:8000");
//!
//!     let logs = client.list_logs(100).await?;
//!     println!("{} log entries", logs.len());
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;
mod logs;
pub mod sse;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use logs::{EventStream, entries_from_records};

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

/// HTTP client for the dashboard API
///
/// Methods are grouped by resource:
/// - Request logs (list, clear, live stream)
/// - Background jobs (list, stop, delete, log history)
#[derive(Debug, Clone)]
pub struct DashboardClient {
    /// Base URL of the server (e.g., "http://localhost:8000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl DashboardClient {
    /// Create a new dashboard client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the server (e.g., "http://localhost:8000")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new dashboard client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, cookies, etc. Note that
    /// a request timeout also bounds the lifetime of the live log stream.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Base URL extended by `segments`, each one percent-encoded
    fn segments_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and deserialize the JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Check the status code of a response whose body is not needed
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        Self::check_status(response).await.map(|_| ())
    }

    /// Turn a non-success response into [`ClientError::ApiError`]
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ClientError::from_body(status.as_u16(), &body))
    }
}
