use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{JobRepository, RepositoryError};
use crate::domain::{Job, JobId, JobKind, JobStatus, JobUpdate, ProcessedFile};

const JOB_COLUMNS: &str = r#"job_id, kind, status, progress, created_at, updated_at, filename,
    file_path, url, "limit", parsed_data, processed_files, error, owner"#;

pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    #[instrument(skip(self, job), fields(job_id = %job.job_id))]
    async fn create(&self, job: &Job) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO jobs (job_id, kind, status, progress, created_at, updated_at, filename,
                file_path, url, "limit", parsed_data, processed_files, error, owner)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(job.job_id.as_str())
        .bind(job.kind.as_str())
        .bind(job.status.as_str())
        .bind(i16::from(job.progress))
        .bind(job.created_at)
        .bind(job.updated_at)
        .bind(&job.filename)
        .bind(&job.file_path)
        .bind(&job.url)
        .bind(job.limit.map(|l| l as i32))
        .bind(job.parsed_data.as_ref().map(Json))
        .bind(job.processed_files.as_ref().map(Json))
        .bind(&job.error)
        .bind(&job.owner)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::DuplicateJob(job.job_id.to_string())
            }
            other => RepositoryError::QueryFailed(other.to_string()),
        })?;

        Ok(())
    }

    #[instrument(skip(self), fields(job_id = %job_id))]
    async fn get(&self, job_id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE job_id = $1"))
            .bind(job_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.as_ref().map(job_from_row).transpose()
    }

    #[instrument(skip(self, update), fields(job_id = %job_id))]
    async fn update(
        &self,
        job_id: &JobId,
        update: JobUpdate,
    ) -> Result<Option<Job>, RepositoryError> {
        // updated_at must advance even when two writes share a clock tick.
        let row = sqlx::query(&format!(
            r#"
            UPDATE jobs SET
                status = COALESCE($2, status),
                progress = COALESCE($3, progress),
                filename = COALESCE($4, filename),
                file_path = COALESCE($5, file_path),
                parsed_data = COALESCE($6, parsed_data),
                processed_files = COALESCE($7, processed_files),
                error = COALESCE($8, error),
                updated_at = GREATEST($9, updated_at + INTERVAL '1 microsecond')
            WHERE job_id = $1
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id.as_str())
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.progress.map(|p| i16::from(p.min(100))))
        .bind(update.filename)
        .bind(update.file_path)
        .bind(update.parsed_data.map(Json))
        .bind(update.processed_files.map(Json))
        .bind(update.error)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.as_ref().map(job_from_row).transpose()
    }

    #[instrument(skip(self), fields(job_id = %job_id))]
    async fn delete(&self, job_id: &JobId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM jobs WHERE job_id = $1")
            .bind(job_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

fn job_from_row(row: &PgRow) -> Result<Job, RepositoryError> {
    let query_err = |e: sqlx::Error| RepositoryError::QueryFailed(e.to_string());

    let kind = row
        .try_get::<String, _>("kind")
        .map_err(query_err)?
        .parse::<JobKind>()
        .map_err(RepositoryError::CorruptRecord)?;
    let status = row
        .try_get::<String, _>("status")
        .map_err(query_err)?
        .parse::<JobStatus>()
        .map_err(RepositoryError::CorruptRecord)?;
    let progress: i16 = row.try_get("progress").map_err(query_err)?;
    let limit: Option<i32> = row.try_get("limit").map_err(query_err)?;
    let parsed_data: Option<Json<Vec<String>>> = row.try_get("parsed_data").map_err(query_err)?;
    let processed_files: Option<Json<Vec<ProcessedFile>>> =
        row.try_get("processed_files").map_err(query_err)?;

    Ok(Job {
        job_id: JobId::from_raw(row.try_get::<String, _>("job_id").map_err(query_err)?),
        kind,
        status,
        progress: progress.clamp(0, 100) as u8,
        created_at: row.try_get("created_at").map_err(query_err)?,
        updated_at: row.try_get("updated_at").map_err(query_err)?,
        filename: row.try_get("filename").map_err(query_err)?,
        file_path: row.try_get("file_path").map_err(query_err)?,
        url: row.try_get("url").map_err(query_err)?,
        limit: limit.map(|l| l.max(0) as u32),
        parsed_data: parsed_data.map(|Json(data)| data),
        processed_files: processed_files.map(|Json(files)| files),
        error: row.try_get("error").map_err(query_err)?,
        owner: row.try_get("owner").map_err(query_err)?,
    })
}
