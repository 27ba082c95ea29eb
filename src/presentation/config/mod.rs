mod environment;
mod settings;

pub use environment::{ENVIRONMENT_VAR, Environment};
pub use settings::{
    CrawlerSettings, DatabaseSettings, EmbeddingProvider, EmbeddingsSettings, LoggingSettings,
    NotificationSettings, ServerSettings, Settings, StorageSettings, WorkerSettings,
};
