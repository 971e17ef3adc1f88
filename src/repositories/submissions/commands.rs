use sqlx::PgPool;

use crate::db::models::Submission;
use crate::db::types::SubmissionStatus;

use super::types::{NewSubmission, COLUMNS};

pub(crate) async fn create(
    pool: &PgPool,
    params: NewSubmission<'_>,
) -> Result<Submission, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "INSERT INTO submissions (student_name, uploaded_file, submitted_at, status)
         VALUES ($1, $2, $3, $4)
         RETURNING {COLUMNS}"
    ))
    .bind(params.student_name)
    .bind(params.uploaded_file)
    .bind(params.submitted_at)
    .bind(SubmissionStatus::Pending)
    .fetch_one(pool)
    .await
}

pub(crate) async fn attach_task_id(
    pool: &PgPool,
    id: i64,
    task_id: &str,
) -> Result<bool, sqlx::Error> {
    let updated = sqlx::query("UPDATE submissions SET task_id = $1 WHERE id = $2")
        .bind(task_id)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(updated.rows_affected() > 0)
}

/// Moves a submission to `next` only if its current status is one of the
/// allowed predecessors. Returns `false` when the guard rejected the write
/// (unknown id, or the record already moved past that point).
pub(crate) async fn transition_status(
    pool: &PgPool,
    id: i64,
    next: SubmissionStatus,
) -> Result<bool, sqlx::Error> {
    let allowed: Vec<&'static str> =
        next.predecessors().iter().map(|status| status.as_str()).collect();

    let updated = sqlx::query(
        "UPDATE submissions
         SET status = $1
         WHERE id = $2
           AND status::text = ANY($3)",
    )
    .bind(next)
    .bind(id)
    .bind(allowed)
    .execute(pool)
    .await?;

    Ok(updated.rows_affected() > 0)
}
