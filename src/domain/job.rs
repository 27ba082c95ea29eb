use chrono::{DateTime, Duration, Utc};

use super::{JobId, JobKind, JobPayload, JobStatus, ProcessedFile};

/// Persisted job record. Field names follow the stored document shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub job_id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub filename: Option<String>,
    pub file_path: Option<String>,
    pub url: Option<String>,
    pub limit: Option<u32>,
    pub parsed_data: Option<Vec<String>>,
    pub processed_files: Option<Vec<ProcessedFile>>,
    pub error: Option<String>,
    pub owner: Option<String>,
}

impl Job {
    pub fn new(job_id: JobId, payload: &JobPayload, owner: Option<String>) -> Self {
        let now = Utc::now();
        let mut job = Self {
            job_id,
            kind: payload.kind(),
            status: JobStatus::Queued,
            progress: 0,
            created_at: now,
            updated_at: now,
            filename: None,
            file_path: None,
            url: None,
            limit: None,
            parsed_data: None,
            processed_files: None,
            error: None,
            owner,
        };

        match payload {
            JobPayload::Convert {
                filename,
                file_path,
            } => {
                job.filename = Some(filename.clone());
                job.file_path = Some(file_path.display().to_string());
            }
            JobPayload::Parse { url, limit } => {
                job.url = Some(url.to_string());
                job.limit = Some(*limit);
            }
        }

        job
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Partial merge: only fields present in `update` are written, and
    /// `updated_at` always moves forward, even if the clock does not.
    pub fn apply(&mut self, update: JobUpdate, now: DateTime<Utc>) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(progress) = update.progress {
            self.progress = progress.min(100);
        }
        if let Some(filename) = update.filename {
            self.filename = Some(filename);
        }
        if let Some(file_path) = update.file_path {
            self.file_path = Some(file_path);
        }
        if let Some(parsed_data) = update.parsed_data {
            self.parsed_data = Some(parsed_data);
        }
        if let Some(processed_files) = update.processed_files {
            self.processed_files = Some(processed_files);
        }
        if let Some(error) = update.error {
            self.error = Some(error);
        }

        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<u8>,
    pub filename: Option<String>,
    pub file_path: Option<String>,
    pub parsed_data: Option<Vec<String>>,
    pub processed_files: Option<Vec<ProcessedFile>>,
    pub error: Option<String>,
}

impl JobUpdate {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn progress(progress: u8) -> Self {
        Self {
            progress: Some(progress),
            ..Self::default()
        }
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Kind-specific result a worker hands to the status protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Converted(ProcessedFile),
    Parsed {
        parsed_data: Vec<String>,
        processed_files: Vec<ProcessedFile>,
    },
}

impl JobOutcome {
    pub fn into_update(self) -> JobUpdate {
        match self {
            JobOutcome::Converted(file) => JobUpdate {
                filename: Some(file.filename),
                file_path: Some(file.file_path),
                ..JobUpdate::default()
            },
            JobOutcome::Parsed {
                parsed_data,
                processed_files,
            } => JobUpdate {
                parsed_data: Some(parsed_data),
                processed_files: Some(processed_files),
                ..JobUpdate::default()
            },
        }
    }
}
