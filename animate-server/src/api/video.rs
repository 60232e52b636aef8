//! Video API Handlers
//!
//! Serve a completed job's video, inline or as a download. The file is
//! streamed from disk rather than read into memory.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};
use tokio_util::io::ReaderStream;

use crate::api::error::{ApiError, ApiResult};
use crate::api::job::parse_job_id;
use crate::service::job::VIDEO_CONTENT_TYPE;
use crate::service::{Artifact, ArtifactMode, JobService};

/// GET /api/video/{job_id}
/// Inline playback of the generated video
pub async fn stream_video(
    State(jobs): State<Arc<JobService>>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    serve(&jobs, &job_id, ArtifactMode::Stream).await
}

/// GET /api/download/{job_id}
/// Generated video as an attachment named `express_animate_{job_id}.mp4`
pub async fn download_video(
    State(jobs): State<Arc<JobService>>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    serve(&jobs, &job_id, ArtifactMode::Download).await
}

async fn serve(jobs: &JobService, job_id: &str, mode: ArtifactMode) -> ApiResult<Response> {
    let id = parse_job_id(job_id)?;
    tracing::debug!("Serving video of job {} ({:?})", id, mode);

    let artifact = jobs.fetch_artifact(id, mode).await?;
    into_response(artifact)
}

fn into_response(artifact: Artifact) -> ApiResult<Response> {
    let disposition = artifact.content_disposition();
    let len = artifact.len;
    let stream = ReaderStream::new(artifact.file);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, VIDEO_CONTENT_TYPE)
        .header(header::CONTENT_LENGTH, len.to_string())
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::InternalError(e.to_string()))
}
