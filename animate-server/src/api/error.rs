//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use animate_core::dto::job::ErrorResponse;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::service::JobError;

pub const MSG_JOB_NOT_FOUND: &str = "Job not found";
pub const MSG_NOT_READY: &str = "Animation not ready";

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Validation(e) => ApiError::BadRequest(e.to_string()),
            JobError::NotFound(_) => ApiError::NotFound(MSG_JOB_NOT_FOUND.to_string()),
            JobError::NotReady(_) => ApiError::BadRequest(MSG_NOT_READY.to_string()),
            JobError::InvalidState(msg) => ApiError::BadRequest(msg),
            JobError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use animate_core::params::ValidationError;
    use uuid::Uuid;

    #[test]
    fn test_job_error_mapping() {
        let status = |err: JobError| ApiError::from(err).into_response().status();

        assert_eq!(
            status(JobError::Validation(ValidationError::EmptyPrompt)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(JobError::NotFound(Uuid::new_v4())), StatusCode::NOT_FOUND);
        assert_eq!(status(JobError::NotReady(Uuid::new_v4())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(JobError::Internal("disk on fire".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
