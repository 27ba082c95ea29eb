use super::job_lifecycle::LifecycleError;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("lifecycle: {0}")]
    Lifecycle(#[from] LifecycleError),
}
