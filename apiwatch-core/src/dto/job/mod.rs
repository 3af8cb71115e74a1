//! Background job DTOs

use serde::{Deserialize, Serialize};

use crate::domain::job::{JobLogLine, JobRecord};

/// Body of `GET /api/background-jobs/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsResponse {
    pub jobs: Vec<JobRecord>,
}

/// Body of `GET /api/background-jobs/{id}/logs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLogsResponse {
    pub logs: Vec<JobLogLine>,
}

/// Generic `{ "message": ... }` acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}
