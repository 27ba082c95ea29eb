use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Job, ProcessedFile};

/// Wire shape of a job record as returned to polling clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobView {
    pub job_id: String,
    pub kind: String,
    pub status: String,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_data: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_files: Option<Vec<ProcessedFile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.job_id.as_str().to_string(),
            kind: job.kind.as_str().to_string(),
            status: job.status.as_str().to_string(),
            progress: job.progress,
            created_at: job.created_at,
            updated_at: job.updated_at,
            filename: job.filename.clone(),
            file_path: job.file_path.clone(),
            url: job.url.clone(),
            limit: job.limit,
            parsed_data: job.parsed_data.clone(),
            processed_files: job.processed_files.clone(),
            error: job.error.clone(),
        }
    }
}
