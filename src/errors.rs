use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type for feed decoding, artifact persistence, and modeling failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("line {line}: invalid feed record: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write '{}': {reason}", .path.display())]
    Persist { path: PathBuf, reason: String },
    #[error("topic modeling failed: {0}")]
    Modeling(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl PipelineError {
    pub(crate) fn persist(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PipelineError::Persist {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
