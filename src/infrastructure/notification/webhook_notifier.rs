use reqwest::Client;
use serde::Serialize;
use tokio::runtime::Handle;

use crate::application::ports::{JobNotification, JobNotifier, NotifierError};

/// Posts each notification as JSON to a fixed URL. Delivery runs on a
/// spawned task; failures are logged and otherwise dropped.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    job_id: &'a str,
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    recipient: Option<&'a str>,
    details: &'a str,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }
}

impl JobNotifier for WebhookNotifier {
    fn notify(&self, notification: &JobNotification) -> Result<(), NotifierError> {
        let handle = Handle::try_current().map_err(|_| NotifierError::NoRuntime)?;

        let body = serde_json::to_value(WebhookPayload {
            job_id: notification.job_id.as_str(),
            status: notification.status.as_str(),
            recipient: notification.recipient.as_deref(),
            details: &notification.details,
        })
        .map_err(|e| NotifierError::Rejected(e.to_string()))?;

        let request = self.client.post(&self.url).json(&body);
        let job_id = notification.job_id.clone();

        handle.spawn(async move {
            match request.send().await.and_then(|r| r.error_for_status()) {
                Ok(_) => tracing::debug!(job_id = %job_id, "Webhook notification delivered"),
                Err(e) => {
                    tracing::warn!(job_id = %job_id, error = %e, "Webhook notification failed")
                }
            }
        });

        Ok(())
    }
}
