use crate::domain::{JobId, JobStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct JobNotification {
    pub recipient: Option<String>,
    pub job_id: JobId,
    pub status: JobStatus,
    pub details: String,
}

/// Hook invoked on every terminal transition. Implementations must return
/// promptly; delivery happens out of band and its failures never reach the
/// job.
pub trait JobNotifier: Send + Sync {
    fn notify(&self, notification: &JobNotification) -> Result<(), NotifierError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("notification rejected: {0}")]
    Rejected(String),
    #[error("no async runtime available for delivery")]
    NoRuntime,
}
