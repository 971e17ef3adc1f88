mod intake;
mod status;

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};

use crate::api::errors::ApiError;
use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    let submit = || post(intake::submit_assignment).fallback(only_post);
    // HEAD is answered by `get` unless it has its own handler.
    let status = || get(status::submission_status).head(only_get).fallback(only_get);

    Router::new()
        .route("/submit", submit())
        .route("/submit/", submit())
        .route("/status/:submission_id", status())
        .route("/status/:submission_id/", status())
}

async fn only_post(method: Method) -> ApiError {
    ApiError::MethodNotAllowed { method, allowed: Method::POST }
}

async fn only_get(method: Method) -> ApiError {
    ApiError::MethodNotAllowed { method, allowed: Method::GET }
}
