use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::domain::{JobId, JobPayload};

/// Descriptor handed from the submitter to the worker pool.
#[derive(Debug, Clone, PartialEq)]
pub struct JobTask {
    pub job_id: JobId,
    pub payload: JobPayload,
}

/// Producer half of the task queue. `submit` never waits for a worker: the
/// task is either accepted into the bounded queue or rejected immediately.
///
/// Accepted tasks are executed at least once by some worker; no ordering is
/// promised between different jobs.
#[derive(Clone)]
pub struct TaskDispatcher {
    sender: mpsc::Sender<JobTask>,
}

/// Consumer half of the task queue, owned by the worker pool.
pub struct TaskQueue {
    receiver: mpsc::Receiver<JobTask>,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("dispatch unavailable: {0}")]
    Unavailable(String),
}

pub fn task_queue(capacity: usize) -> (TaskDispatcher, TaskQueue) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (TaskDispatcher { sender }, TaskQueue { receiver })
}

impl TaskDispatcher {
    pub fn submit(&self, job_id: JobId, payload: JobPayload) -> Result<(), DispatchError> {
        let kind = payload.kind();
        self.sender
            .try_send(JobTask { job_id, payload })
            .map_err(|e| match e {
                TrySendError::Full(task) => DispatchError::Unavailable(format!(
                    "task queue is full, job {} was not accepted",
                    task.job_id
                )),
                TrySendError::Closed(task) => DispatchError::Unavailable(format!(
                    "task queue is closed, job {} was not accepted",
                    task.job_id
                )),
            })?;

        tracing::debug!(kind = %kind, "Job task enqueued");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl TaskQueue {
    pub(crate) fn into_receiver(self) -> mpsc::Receiver<JobTask> {
        self.receiver
    }
}
