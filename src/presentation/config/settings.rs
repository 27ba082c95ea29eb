use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, File};
use serde::Deserialize;

use super::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub workers: WorkerSettings,
    pub crawler: CrawlerSettings,
    pub embeddings: EmbeddingsSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub output_dir: PathBuf,
    pub upload_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSettings {
    pub pool_size: usize,
    pub queue_capacity: usize,
    pub job_deadline_secs: u64,
    pub io_timeout_secs: u64,
}

impl WorkerSettings {
    pub fn job_deadline(&self) -> Duration {
        Duration::from_secs(self.job_deadline_secs)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerSettings {
    pub page_timeout_secs: u64,
    pub image_timeout_secs: u64,
    pub user_agent: String,
    pub default_limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsSettings {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub dimension: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    Hashing,
    #[serde(rename = "openai")]
    OpenAi,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationSettings {
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub json: bool,
}

impl Settings {
    /// Layers built-in defaults, then `appsettings.{env}.toml` if present, then
    /// `APP_*` variables (`APP_WORKERS__POOL_SIZE=8`).
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        let file_name = format!("appsettings.{}", environment.as_str());

        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("storage.output_dir", "processed")?
            .set_default("storage.upload_dir", "uploads")?
            .set_default("workers.pool_size", 4)?
            .set_default("workers.queue_capacity", 256)?
            .set_default("workers.job_deadline_secs", 300)?
            .set_default("workers.io_timeout_secs", 30)?
            .set_default("crawler.page_timeout_secs", 10)?
            .set_default("crawler.image_timeout_secs", 10)?
            .set_default("crawler.user_agent", concat!("rasterq/", env!("CARGO_PKG_VERSION")))?
            .set_default("crawler.default_limit", 5)?
            .set_default("embeddings.provider", "hashing")?
            .set_default("embeddings.model", "text-embedding-3-small")?
            .set_default("embeddings.base_url", "https://api.openai.com/v1")?
            .set_default("embeddings.dimension", 768)?
            .add_source(File::with_name(&file_name).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
