//! Health and informational endpoints

use animate_core::dto::job::HelloResponse;
use axum::{Json, http::StatusCode, response::IntoResponse};

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /api/hello
pub async fn hello() -> Json<HelloResponse> {
    Json(HelloResponse {
        message: "Express Animate API is running!".to_string(),
        status: "success".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /favicon.ico
pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}
