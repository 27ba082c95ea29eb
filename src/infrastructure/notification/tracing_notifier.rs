use crate::application::ports::{JobNotification, JobNotifier, NotifierError};

/// Emits each notification as a structured log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl JobNotifier for TracingNotifier {
    fn notify(&self, notification: &JobNotification) -> Result<(), NotifierError> {
        tracing::info!(
            job_id = %notification.job_id,
            status = %notification.status,
            recipient = notification.recipient.as_deref().unwrap_or("-"),
            details = %notification.details,
            "Job finished"
        );
        Ok(())
    }
}
