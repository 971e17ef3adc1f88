mod worker;

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::db::types::SubmissionStatus;

pub(crate) use worker::handle_job;

#[derive(Debug, Error)]
pub(crate) enum ProcessingError {
    #[error("Submission {0} not found.")]
    NotFound(i64),
    #[error("Submission {id} is already {status}.")]
    AlreadyHandled { id: i64, status: SubmissionStatus },
    #[error("Submission {0} changed status while it was being processed.")]
    StatusConflict(i64),
    #[error("File not found at path: {}", .0.display())]
    FileMissing(PathBuf),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ProcessingError {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyHandled { .. } => "already_handled",
            Self::StatusConflict(_) => "status_conflict",
            Self::FileMissing(_) => "file_missing",
            Self::Database(_) => "database",
        }
    }
}

/// Failure outcome of one job, worded the way it is stored in the result backend.
#[derive(Debug, Error)]
#[error("Failed to process submission {submission_id}. Error: {error}")]
pub(crate) struct JobFailure {
    pub(crate) submission_id: i64,
    #[source]
    pub(crate) error: ProcessingError,
}

/// Placeholder for real grading work: the upload must exist, then the call
/// just waits `delay`.
pub(crate) async fn simulate_work(file_path: &Path, delay: Duration) -> Result<(), ProcessingError> {
    if !tokio::fs::try_exists(file_path).await.unwrap_or(false) {
        return Err(ProcessingError::FileMissing(file_path.to_path_buf()));
    }

    tokio::time::sleep(delay).await;
    Ok(())
}
