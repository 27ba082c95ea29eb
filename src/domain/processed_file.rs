use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedFile {
    pub filename: String,
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl ProcessedFile {
    pub fn new(filename: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            file_path: file_path.into(),
            source_url: None,
        }
    }

    pub fn with_source_url(mut self, source_url: impl Into<String>) -> Self {
        self.source_url = Some(source_url.into());
        self
    }
}
