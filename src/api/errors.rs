use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::schemas::submission::FieldErrors;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Validation(FieldErrors),
    NotFound(String),
    MethodNotAllowed { method: Method, allowed: Method },
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    pub(crate) fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::Validation(errors) => (
                status,
                Json(ErrorResponse {
                    status: "error",
                    message: "Form validation failed.".to_string(),
                    errors: Some(errors),
                }),
            )
                .into_response(),
            ApiError::NotFound(message) => {
                (status, Json(ErrorResponse { status: "error", message, errors: None }))
                    .into_response()
            }
            ApiError::MethodNotAllowed { method, allowed } => {
                let message = format!("Method {method} not allowed. Please use {allowed}.");
                let mut response =
                    (status, Json(ErrorResponse { status: "error", message, errors: None }))
                        .into_response();
                if let Ok(value) = HeaderValue::from_str(allowed.as_str()) {
                    response.headers_mut().insert(header::ALLOW, value);
                }
                response
            }
            ApiError::Internal(message) => {
                (status, Json(ErrorResponse { status: "error", message, errors: None }))
                    .into_response()
            }
        }
    }
}
