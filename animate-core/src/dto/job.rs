//! Job DTOs for the HTTP API

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::job::JobStatus;

/// Body of `POST /api/generate`
///
/// Every field is optional on the wire; missing values are filled in by
/// `params::GenerationParams::from_request`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    /// Output resolution, e.g. `1280*720` or `720p`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_prompt_expansion: Option<bool>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Default::default()
        }
    }
}

/// Response of `POST /api/generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub message: String,
}

/// Response of `GET /api/hello`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloResponse {
    pub message: String,
    pub status: String,
    pub version: String,
}

/// JSON error body returned by every failing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_accepts_partial_body() {
        let req: GenerateRequest =
            serde_json::from_str(r#"{"prompt": "A cat on a skateboard", "duration": 5}"#).unwrap();
        assert_eq!(req.prompt.as_deref(), Some("A cat on a skateboard"));
        assert_eq!(req.duration, Some(5));
        assert!(req.quality.is_none());
        assert!(req.enable_prompt_expansion.is_none());
    }

    #[test]
    fn test_generate_request_omits_unset_fields() {
        let value = serde_json::to_value(GenerateRequest::new("hi")).unwrap();
        assert_eq!(value, serde_json::json!({ "prompt": "hi" }));
    }
}
