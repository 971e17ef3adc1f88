use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};

use crate::api::errors::ApiError;
use crate::core::{state::AppState, time::primitive_now_utc};
use crate::repositories;
use crate::schemas::submission::{
    field_errors, SubmissionForm, SubmitResponse, UploadedFile, ValidSubmission,
};
use crate::services::job_queue::ProcessSubmission;

const FORM_PROCESSING_ERROR: &str = "Server error during form processing.";
const AFTER_VALIDATION_ERROR: &str = "Internal server error after validation.";

pub(in crate::api::submissions) async fn submit_assignment(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let multipart = multipart.map_err(|e| ApiError::internal(e, FORM_PROCESSING_ERROR))?;
    let form = read_form(multipart).await?;

    let submission = match form.into_valid() {
        Ok(submission) => submission,
        Err(errors) => {
            let errors = field_errors(&errors);
            metrics::counter!("submissions_rejected_total").increment(1);
            tracing::info!(
                fields = ?errors.keys().collect::<Vec<_>>(),
                "Submission rejected by validation"
            );
            return Err(ApiError::Validation(errors));
        }
    };

    let response = accept(&state, submission).await?;
    metrics::counter!("submissions_accepted_total").increment(1);

    Ok((StatusCode::CREATED, Json(response)))
}

async fn read_form(mut multipart: Multipart) -> Result<SubmissionForm, ApiError> {
    let mut form = SubmissionForm::default();

    while let Some(field) =
        multipart.next_field().await.map_err(|e| ApiError::internal(e, FORM_PROCESSING_ERROR))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "student_name" => {
                let text =
                    field.text().await.map_err(|e| ApiError::internal(e, FORM_PROCESSING_ERROR))?;
                let text = text.trim();
                form.student_name = (!text.is_empty()).then(|| text.to_string());
            }
            "uploaded_file" => {
                // A part without a filename is a plain form value, not a file.
                let Some(file_name) = field.file_name().map(str::to_string) else {
                    continue;
                };
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::internal(e, FORM_PROCESSING_ERROR))?;
                form.uploaded_file =
                    Some(UploadedFile { file_name, content_type, bytes: bytes.to_vec() });
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Stores the file, creates the record, queues the job and attaches its id.
/// These steps are not atomic: a failure after the record exists leaves it
/// PENDING without a task id.
async fn accept(state: &AppState, submission: ValidSubmission) -> Result<SubmitResponse, ApiError> {
    let ValidSubmission { student_name, uploaded_file } = submission;
    let storage = state.storage();

    let stored = storage
        .save(&student_name, &uploaded_file.file_name, &uploaded_file.bytes)
        .await
        .map_err(|e| ApiError::internal(e, AFTER_VALIDATION_ERROR))?;

    let record = match repositories::submissions::create(
        state.db(),
        repositories::submissions::NewSubmission {
            student_name: &student_name,
            uploaded_file: &stored.relative_path,
            submitted_at: primitive_now_utc(),
        },
    )
    .await
    {
        Ok(record) => record,
        Err(err) => {
            storage.discard(&stored.relative_path).await;
            return Err(ApiError::internal(err, AFTER_VALIDATION_ERROR));
        }
    };

    tracing::info!(
        submission_id = record.id,
        path = %stored.relative_path,
        size = stored.size,
        sha256 = %stored.sha256,
        content_type = uploaded_file.content_type.as_deref().unwrap_or("-"),
        "Submission stored"
    );

    if !storage.exists(&record.uploaded_file).await {
        return Err(ApiError::internal(
            format!("stored upload missing at {}", stored.absolute_path.display()),
            AFTER_VALIDATION_ERROR,
        ));
    }

    let task_id = state
        .jobs()
        .enqueue(ProcessSubmission {
            submission_id: record.id,
            student_name: record.student_name.clone(),
            file_path: stored.absolute_path.to_string_lossy().into_owned(),
        })
        .await
        .map_err(|e| ApiError::internal(e, AFTER_VALIDATION_ERROR))?;

    let attached = repositories::submissions::attach_task_id(state.db(), record.id, &task_id)
        .await
        .map_err(|e| ApiError::internal(e, AFTER_VALIDATION_ERROR))?;
    if !attached {
        tracing::warn!(submission_id = record.id, %task_id, "Submission vanished before task id was attached");
    }

    tracing::info!(submission_id = record.id, %task_id, "Processing job queued");

    Ok(SubmitResponse {
        status: "success",
        message: format!(
            "Assignment submitted successfully! ID: {} (Task ID: {task_id}). Processing started.",
            record.id
        ),
        submission_id: record.id,
        task_id,
    })
}
