use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::instrument;

use crate::application::ports::RepositoryError;

const CONNECT_ATTEMPTS: u32 = 6;
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connects to the job store, backing off exponentially while the database
/// is still coming up.
#[instrument(skip(url))]
pub async fn create_pool(url: &str, max_connections: u32) -> Result<PgPool, RepositoryError> {
    let options = PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(ACQUIRE_TIMEOUT);
    let mut backoff = INITIAL_BACKOFF;

    for attempt in 1..=CONNECT_ATTEMPTS {
        match options.clone().connect(url).await {
            Ok(pool) => {
                tracing::info!(attempt, "Job store connection pool established");
                return Ok(pool);
            }
            Err(e) if attempt < CONNECT_ATTEMPTS => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    backoff_ms = backoff.as_millis(),
                    "Job store unreachable, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Err(e) => return Err(RepositoryError::ConnectionFailed(e.to_string())),
        }
    }

    Err(RepositoryError::ConnectionFailed(
        "no connection attempts made".to_string(),
    ))
}

/// Applies the bundled `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> Result<(), RepositoryError> {
    sqlx::migrate!()
        .run(pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(format!("migration: {}", e)))?;
    tracing::info!("Job store migrations applied");
    Ok(())
}
