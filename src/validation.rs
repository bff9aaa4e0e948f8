//! Errors for user-triggered actions (generate, export, upload, open report).
use std::path::PathBuf;
use thiserror::Error;

use crate::gateway::ApiError;

/// Rejected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select a week start date")]
    MissingWeek,
    #[error("Please select a file")]
    MissingFile,
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("Unsupported file type '{0}'; expected .csv, .xlsx or .xls")]
    UnsupportedFileType(String),
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// Backend call failed; `message` is what the user sees.
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: ApiError,
    },
    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl ActionError {
    pub fn from_api(source: ApiError, fallback: &str) -> Self {
        ActionError::Failed {
            message: source.user_message(fallback),
            source,
        }
    }

    pub fn io(source: std::io::Error, message: impl Into<String>) -> Self {
        ActionError::Io {
            message: message.into(),
            source,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ActionError::Invalid(_))
    }
}
