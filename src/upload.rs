//! Feedback file ingestion.
use std::path::Path;
use tracing::{info, instrument};

use crate::gateway::AnalyticsApi;
use crate::model::UploadSummary;
use crate::validation::{ActionError, ValidationError};

pub const UPLOAD_FAILED: &str = "Upload failed";

pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

/// Check the selected file before anything is read or sent.
pub fn validate_upload(path: Option<&Path>) -> Result<&Path, ValidationError> {
    let path = path.ok_or(ValidationError::MissingFile)?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ValidationError::UnsupportedFileType(ext));
    }
    if !path.is_file() {
        return Err(ValidationError::FileNotFound(path.to_path_buf()));
    }
    Ok(path)
}

#[instrument(skip_all)]
pub async fn upload(
    api: &dyn AnalyticsApi,
    path: Option<&Path>,
) -> Result<UploadSummary, ActionError> {
    let path = validate_upload(path)?;
    let content = tokio::fs::read(path)
        .await
        .map_err(|err| ActionError::io(err, format!("failed to read {}", path.display())))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("feedback")
        .to_string();

    let summary = api
        .upload_feedback(&file_name, content)
        .await
        .map_err(|err| ActionError::from_api(err, UPLOAD_FAILED))?;
    info!(
        file = %file_name,
        total = summary.total_rows,
        saved = summary.saved_count,
        errors = summary.errors.len(),
        "feedback uploaded"
    );
    Ok(summary)
}
