use std::sync::Arc;

use super::task_dispatcher::{DispatchError, TaskDispatcher};
use crate::application::ports::{JobRepository, RepositoryError};
use crate::domain::{Job, JobId, JobPayload, ValidationError};

/// Submitter-facing entry point: records jobs and hands them to the pool.
pub struct JobService {
    repository: Arc<dyn JobRepository>,
    dispatcher: TaskDispatcher,
}

#[derive(Debug, thiserror::Error)]
pub enum JobServiceError {
    #[error("validation: {0}")]
    Validation(#[from] ValidationError),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("job not found: {0}")]
    NotFound(JobId),
}

impl JobService {
    pub fn new(repository: Arc<dyn JobRepository>, dispatcher: TaskDispatcher) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    pub async fn create_job(
        &self,
        payload: &JobPayload,
        owner: Option<String>,
    ) -> Result<Job, JobServiceError> {
        payload.validate()?;

        let job = Job::new(JobId::new(), payload, owner);
        self.repository.create(&job).await?;

        tracing::debug!(job_id = %job.job_id, kind = %job.kind, "Job record created");
        Ok(job)
    }

    pub fn dispatch(&self, job_id: &JobId, payload: JobPayload) -> Result<(), JobServiceError> {
        self.dispatcher.submit(job_id.clone(), payload)?;
        Ok(())
    }

    /// Creates the record and dispatches it. When the queue refuses the task
    /// the record is removed again so no job is left queued forever.
    pub async fn submit(
        &self,
        payload: JobPayload,
        owner: Option<String>,
    ) -> Result<Job, JobServiceError> {
        let job = self.create_job(&payload, owner).await?;

        if let Err(e) = self.dispatch(&job.job_id, payload) {
            tracing::error!(job_id = %job.job_id, error = %e, "Failed to dispatch job, rolling back");
            if let Err(rollback) = self.repository.delete(&job.job_id).await {
                tracing::error!(
                    job_id = %job.job_id,
                    error = %rollback,
                    "Failed to roll back undispatched job"
                );
            }
            return Err(e);
        }

        tracing::info!(job_id = %job.job_id, kind = %job.kind, "Job enqueued");
        Ok(job)
    }

    pub async fn get_job(&self, job_id: &JobId) -> Result<Job, JobServiceError> {
        self.repository
            .get(job_id)
            .await?
            .ok_or_else(|| JobServiceError::NotFound(job_id.clone()))
    }

    /// False once the worker pool has shut down and the queue is closed.
    pub fn is_accepting(&self) -> bool {
        !self.dispatcher.is_closed()
    }

    pub async fn delete_job(&self, job_id: &JobId) -> Result<bool, JobServiceError> {
        Ok(self.repository.delete(job_id).await?)
    }
}
