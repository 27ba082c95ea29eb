mod tracing_notifier;
mod webhook_notifier;

pub use tracing_notifier::TracingNotifier;
pub use webhook_notifier::WebhookNotifier;
