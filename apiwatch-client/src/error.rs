//! Error types for the dashboard client

use serde_json::Value;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Message used when an error response explains nothing
pub const GENERIC_FAILURE: &str = "Unknown error";

/// Errors that can occur when using the dashboard client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The base URL cannot carry a request path
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The live stream broke mid-flight
    #[error("Stream error: {0}")]
    StreamError(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Create an API error from a raw error response body
    ///
    /// JSON bodies are searched for `detail`, then `error`. Anything else
    /// is used verbatim; an empty body becomes [`GENERIC_FAILURE`].
    pub fn from_body(status: u16, body: &str) -> Self {
        Self::api_error(status, error_message(body))
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }

    /// Message suitable for a one-shot user notification
    pub fn user_message(&self) -> String {
        match self {
            Self::ApiError { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

fn error_message(body: &str) -> String {
    let body = body.trim();

    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
        return ["detail", "error"]
            .iter()
            .find_map(|key| match fields.get(*key) {
                Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
                Some(Value::Null) | None => None,
                Some(Value::String(_)) => None,
                Some(other) => Some(other.to_string()),
            })
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
    }

    if body.is_empty() {
        GENERIC_FAILURE.to_string()
    } else {
        body.to_string()
    }
}
