//! Audit reports for generated ideas

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use research_sdk::IdeaResponse;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to create report directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write report {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Writes one pretty-printed JSON file per idea response
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `research_YYYYMMDD_HHMMSS.txt`; a second report in the same second replaces the first
    pub fn file_name(now: DateTime<Utc>) -> String {
        format!("research_{}.txt", now.format("%Y%m%d_%H%M%S"))
    }

    /// Write the response and return the file path
    pub async fn write(&self, response: &IdeaResponse, now: DateTime<Utc>) -> Result<PathBuf, ReportError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ReportError::CreateDir {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.dir.join(Self::file_name(now));
        let body = serde_json::to_string_pretty(response)?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| ReportError::Write {
                path: path.clone(),
                source,
            })?;

        Ok(path)
    }
}
