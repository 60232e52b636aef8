//! API Module
//!
//! HTTP API layer of the server.
//! Each submodule handles endpoints for a specific concern.

pub mod error;
pub mod health;
pub mod job;
pub mod video;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::service::JobService;

/// Create the main API router with all endpoints
pub fn create_router(jobs: Arc<JobService>, cors: CorsLayer) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/favicon.ico", get(health::favicon))
        .route("/api/hello", get(health::hello))
        // Job endpoints
        .route("/api/generate", post(job::generate))
        .route("/api/status/{job_id}", get(job::get_status))
        .route("/api/cancel/{job_id}", post(job::cancel))
        // Video endpoints
        .route("/api/video/{job_id}", get(video::stream_video))
        .route("/api/download/{job_id}", get(video::download_video))
        // Add state and middleware
        .with_state(jobs)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
