//! Job API Handlers
//!
//! Submission, status polling and cancellation.

use std::sync::Arc;

use animate_core::domain::job::Job;
use animate_core::dto::job::{GenerateRequest, GenerateResponse};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult, MSG_JOB_NOT_FOUND};
use crate::service::JobService;

const MSG_GENERATION_STARTED: &str = "Animation generation started";

/// POST /api/generate
/// Validate the request and start a background generation job
pub async fn generate(
    State(jobs): State<Arc<JobService>>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Json<GenerateResponse>> {
    let Json(req) = body?;
    tracing::debug!("Generation request: {:?}", req);

    let job = jobs.submit(req)?;

    Ok(Json(GenerateResponse {
        job_id: job.id(),
        status: job.status(),
        message: MSG_GENERATION_STARTED.to_string(),
    }))
}

/// GET /api/status/{job_id}
/// Full job record
pub async fn get_status(
    State(jobs): State<Arc<JobService>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Job>> {
    let id = parse_job_id(&job_id)?;
    tracing::debug!("Getting status of job: {}", id);

    Ok(Json(jobs.get_status(id)?))
}

/// POST /api/cancel/{job_id}
/// Cancel a job that is still running
pub async fn cancel(
    State(jobs): State<Arc<JobService>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Job>> {
    let id = parse_job_id(&job_id)?;
    tracing::info!("Cancellation requested for job: {}", id);

    Ok(Json(jobs.cancel(id).await?))
}

/// Job ids that are not UUIDs cannot exist, so they are reported as unknown
pub(crate) fn parse_job_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(MSG_JOB_NOT_FOUND.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_job_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_job_id(&id.to_string()).unwrap(), id);
        assert!(matches!(parse_job_id("not-a-uuid"), Err(ApiError::NotFound(_))));
    }
}
