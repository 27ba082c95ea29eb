use std::collections::HashMap;
use std::collections::hash_map::Entry;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::application::ports::{JobRepository, RepositoryError};
use crate::domain::{Job, JobId, JobUpdate};

/// Process-local job store. The write lock serializes concurrent updates, so
/// each `update` is an atomic read-merge-write of one record.
#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, job: &Job) -> Result<(), RepositoryError> {
        let mut jobs = self.jobs.write().await;
        match jobs.entry(job.job_id.clone()) {
            Entry::Occupied(_) => Err(RepositoryError::DuplicateJob(job.job_id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(job.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, job_id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.jobs.read().await.get(job_id).cloned())
    }

    async fn update(
        &self,
        job_id: &JobId,
        update: JobUpdate,
    ) -> Result<Option<Job>, RepositoryError> {
        let mut jobs = self.jobs.write().await;
        Ok(jobs.get_mut(job_id).map(|job| {
            job.apply(update, Utc::now());
            job.clone()
        }))
    }

    async fn delete(&self, job_id: &JobId) -> Result<bool, RepositoryError> {
        Ok(self.jobs.write().await.remove(job_id).is_some())
    }
}
