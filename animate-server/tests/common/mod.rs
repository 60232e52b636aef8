#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use animate_core::params::GenerationParams;
use animate_provider::{ProviderError, VideoProvider};
use animate_server::api;
use animate_server::repository::InMemoryJobStore;
use animate_server::service::JobService;
use animate_server::storage::ArtifactStorage;
use animate_server::worker::WorkerConfig;
use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, Response};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

pub const VIDEO_BYTES: &[u8] = b"\x00\x00\x00\x18ftypmp42 fake video";

/// Provider whose behaviour is picked by a marker in the prompt
///
/// - `[fail]` returns an error
/// - `[empty]` reports no output
/// - `[panic]` panics
/// - `[hang]` never finishes
/// - `[slow]` takes 300ms before writing a file
/// - anything else writes a file after a short delay
pub struct ScriptedProvider {
    output_dir: PathBuf,
}

impl ScriptedProvider {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    async fn write_output(&self) -> animate_provider::Result<Option<PathBuf>> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self
            .output_dir
            .join(format!("{}.mp4", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, VIDEO_BYTES).await?;
        Ok(Some(path))
    }
}

#[async_trait]
impl VideoProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        params: &GenerationParams,
    ) -> animate_provider::Result<Option<PathBuf>> {
        let prompt = params.prompt.as_str();
        if prompt.contains("[fail]") {
            return Err(ProviderError::api_error(500, "model exploded"));
        }
        if prompt.contains("[empty]") {
            return Ok(None);
        }
        if prompt.contains("[panic]") {
            panic!("provider bug");
        }
        if prompt.contains("[hang]") {
            std::future::pending::<()>().await;
        }
        if prompt.contains("[slow]") {
            tokio::time::sleep(Duration::from_millis(300)).await;
        } else {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.write_output().await
    }
}

pub struct TestApp {
    pub router: Router,
    pub service: Arc<JobService>,
    pub tmp: TempDir,
}

/// Build the full router on top of a scripted provider and a temp directory
pub fn build_test_app() -> TestApp {
    build_test_app_with(WorkerConfig {
        max_concurrent_jobs: 4,
        job_timeout: Duration::from_secs(10),
    })
}

pub fn build_test_app_with(config: WorkerConfig) -> TestApp {
    let tmp = tempfile::tempdir().unwrap();
    let provider = Arc::new(ScriptedProvider::new(tmp.path().join("provider")));
    let service = Arc::new(JobService::new(
        Arc::new(InMemoryJobStore::new()),
        provider,
        ArtifactStorage::new(tmp.path().join("generated")),
        config,
    ));
    let router = api::create_router(Arc::clone(&service), CorsLayer::permissive());

    TestApp {
        router,
        service,
        tmp,
    }
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn post(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: &Router, uri: &str, body: impl Into<String>) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.into()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}

/// Submit a prompt and return the new job id
pub async fn submit(app: &Router, prompt: &str) -> String {
    let response = post_json(app, "/api/generate", serde_json::json!({ "prompt": prompt })).await;
    assert_eq!(response.status(), 200);
    let json = body_json(response).await;
    json["job_id"].as_str().unwrap().to_string()
}

/// Poll the status endpoint until the job is completed or failed
pub async fn wait_for_terminal(app: &Router, job_id: &str) -> serde_json::Value {
    let uri = format!("/api/status/{}", job_id);
    for _ in 0..200 {
        let json = body_json(get(app, &uri).await).await;
        if json["status"] == "completed" || json["status"] == "failed" {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("job {} did not finish in time", job_id);
}
