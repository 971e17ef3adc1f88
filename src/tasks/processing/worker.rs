use std::path::Path;
use std::time::Duration;

use sqlx::PgPool;

use crate::db::types::SubmissionStatus;
use crate::repositories;
use crate::services::job_queue::ProcessSubmission;

use super::{simulate_work, JobFailure, ProcessingError};

/// Runs one processing job against its submission record.
///
/// The record moves to PROCESSING before the work starts and receives exactly
/// one final write afterwards (COMPLETE or FAILED). A missing record, or one
/// that already left PENDING, is reported without touching the stored status.
pub(crate) async fn handle_job(
    db: &PgPool,
    job: &ProcessSubmission,
    delay: Duration,
) -> Result<String, JobFailure> {
    let id = job.submission_id;
    let fail = |error: ProcessingError| JobFailure { submission_id: id, error };

    tracing::info!(
        submission_id = id,
        student_name = %job.student_name,
        file_path = %job.file_path,
        "Starting submission processing"
    );

    let submission = repositories::submissions::find_by_id(db, id)
        .await
        .map_err(|e| fail(e.into()))?
        .ok_or_else(|| fail(ProcessingError::NotFound(id)))?;

    if !submission.status.can_transition_to(SubmissionStatus::Processing) {
        if submission.status.is_terminal() {
            tracing::info!(submission_id = id, status = %submission.status, "Submission already finished");
        } else {
            tracing::warn!(submission_id = id, status = %submission.status, "Submission already in progress");
        }
        return Err(fail(ProcessingError::AlreadyHandled { id, status: submission.status }));
    }

    let work =
        match repositories::submissions::transition_status(db, id, SubmissionStatus::Processing)
            .await
        {
            Ok(true) => simulate_work(Path::new(&job.file_path), delay).await,
            Ok(false) => {
                return Err(fail(ProcessingError::AlreadyHandled { id, status: submission.status }))
            }
            Err(err) => Err(ProcessingError::Database(err)),
        };

    finish(db, id, work).await.map_err(fail)
}

async fn finish(
    db: &PgPool,
    id: i64,
    work: Result<(), ProcessingError>,
) -> Result<String, ProcessingError> {
    let next = if work.is_ok() { SubmissionStatus::Complete } else { SubmissionStatus::Failed };
    let written = repositories::submissions::transition_status(db, id, next).await;

    match (work, written) {
        (Err(error), written) => {
            match written {
                Ok(true) => {}
                Ok(false) => tracing::warn!(submission_id = id, "FAILED status was not applied"),
                Err(err) => {
                    tracing::error!(submission_id = id, error = %err, "Failed to mark submission FAILED")
                }
            }
            Err(error)
        }
        (Ok(()), Ok(true)) => Ok(format!("Successfully processed submission {id}.")),
        (Ok(()), Ok(false)) => Err(ProcessingError::StatusConflict(id)),
        (Ok(()), Err(err)) => Err(ProcessingError::Database(err)),
    }
}
