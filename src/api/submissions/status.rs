use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::submission::SubmissionStatusResponse;

pub(in crate::api::submissions) async fn submission_status(
    Path(submission_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SubmissionStatusResponse>, ApiError> {
    // Ids are positive integers; anything else can never match a record.
    let Ok(id) = submission_id.parse::<i64>() else {
        return Err(not_found(&submission_id));
    };

    let submission = repositories::submissions::find_by_id(state.db(), id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch submission status."))?
        .ok_or_else(|| not_found(&submission_id))?;

    Ok(Json(SubmissionStatusResponse::from(&submission)))
}

fn not_found(submission_id: &str) -> ApiError {
    ApiError::NotFound(format!("Submission with ID {submission_id} not found."))
}
