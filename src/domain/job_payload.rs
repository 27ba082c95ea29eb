use std::path::PathBuf;

use url::Url;

use super::JobKind;

pub const DEFAULT_PARSE_LIMIT: u32 = 5;
pub const MAX_PARSE_LIMIT: u32 = 100;

/// Kind-specific work description handed from the submitter to a worker.
#[derive(Debug, Clone, PartialEq)]
pub enum JobPayload {
    Convert { filename: String, file_path: PathBuf },
    Parse { url: Url, limit: u32 },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("filename must not be empty")]
    EmptyFilename,
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("limit must be between 1 and {MAX_PARSE_LIMIT}, got {0}")]
    LimitOutOfRange(i64),
}

impl JobPayload {
    pub fn convert(
        filename: impl Into<String>,
        file_path: impl Into<PathBuf>,
    ) -> Result<Self, ValidationError> {
        let payload = JobPayload::Convert {
            filename: filename.into(),
            file_path: file_path.into(),
        };
        payload.validate()?;
        Ok(payload)
    }

    pub fn parse(url: &str, limit: i64) -> Result<Self, ValidationError> {
        let url = Url::parse(url.trim()).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;
        let limit = u32::try_from(limit).map_err(|_| ValidationError::LimitOutOfRange(limit))?;
        let payload = JobPayload::Parse { url, limit };
        payload.validate()?;
        Ok(payload)
    }

    pub fn kind(&self) -> JobKind {
        match self {
            JobPayload::Convert { .. } => JobKind::Convert,
            JobPayload::Parse { .. } => JobKind::Parse,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            JobPayload::Convert { filename, .. } => {
                if filename.trim().is_empty() {
                    return Err(ValidationError::EmptyFilename);
                }
            }
            JobPayload::Parse { url, limit } => {
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(ValidationError::InvalidUrl(format!(
                        "unsupported scheme: {}",
                        url.scheme()
                    )));
                }
                if *limit == 0 || *limit > MAX_PARSE_LIMIT {
                    return Err(ValidationError::LimitOutOfRange(i64::from(*limit)));
                }
            }
        }
        Ok(())
    }
}
