use async_trait::async_trait;

use crate::domain::{Job, JobId, JobUpdate};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("duplicate job: {0}")]
    DuplicateJob(String),
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    #[error("corrupt job record: {0}")]
    CorruptRecord(String),
}

/// Document-style job store keyed by `job_id`.
///
/// `update` merges only the supplied fields and always refreshes
/// `updated_at`. Updating or deleting an id that does not exist is not an
/// error: the job may have been removed concurrently.
#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: &Job) -> Result<(), RepositoryError>;

    async fn get(&self, job_id: &JobId) -> Result<Option<Job>, RepositoryError>;

    async fn update(
        &self,
        job_id: &JobId,
        update: JobUpdate,
    ) -> Result<Option<Job>, RepositoryError>;

    async fn delete(&self, job_id: &JobId) -> Result<bool, RepositoryError>;
}
