//! Replicate predictions API
//!
//! Creates a prediction for the configured model, polls it until it reaches
//! a final state and downloads the produced video.

use std::path::{Path, PathBuf};
use std::time::Duration;

use animate_core::params::GenerationParams;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::VideoProvider;
use crate::error::{ProviderError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.replicate.com/v1";
pub const DEFAULT_MODEL: &str = "wan-video/wan-2.5-t2v";
const DELIVERY_BASE_URL: &str = "https://replicate.delivery/";
const MAX_POLL_RETRIES: u32 = 3;

/// Replicate connection settings
#[derive(Debug, Clone)]
pub struct ReplicateConfig {
    pub api_token: String,
    /// Model in `owner/name` form
    pub model: String,
    pub base_url: String,
    /// Delay between prediction status checks
    pub poll_interval: Duration,
    /// Where downloaded videos are written before the server stores them
    pub download_dir: PathBuf,
}

impl ReplicateConfig {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_secs(2),
            download_dir: std::env::temp_dir().join("express-animate"),
        }
    }
}

/// Prediction lifecycle as reported by Replicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    pub fn is_final(self) -> bool {
        matches!(
            self,
            PredictionStatus::Succeeded | PredictionStatus::Failed | PredictionStatus::Canceled
        )
    }
}

/// A Replicate prediction
#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<JsonValue>,
    #[serde(default)]
    pub error: Option<JsonValue>,
}

impl Prediction {
    /// URL of the produced video, if any
    ///
    /// Output is either a single URL or a list whose first string is the
    /// video. Bare paths are resolved against the delivery host.
    pub fn output_url(&self) -> Option<String> {
        let raw = match self.output.as_ref()? {
            JsonValue::String(url) => url.as_str(),
            JsonValue::Array(items) => items.iter().find_map(JsonValue::as_str)?,
            _ => return None,
        };

        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Some(raw.to_string())
        } else {
            Some(format!("{}{}", DELIVERY_BASE_URL, raw.trim_start_matches('/')))
        }
    }

    fn error_message(&self) -> String {
        match &self.error {
            Some(JsonValue::String(msg)) => msg.clone(),
            Some(JsonValue::Null) | None => "no error details".to_string(),
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CreatePrediction<'a> {
    input: PredictionInput<'a>,
}

#[derive(Debug, Serialize)]
struct PredictionInput<'a> {
    prompt: &'a str,
    duration: u32,
    size: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    negative_prompt: &'a str,
    enable_prompt_expansion: bool,
}

impl<'a> From<&'a GenerationParams> for PredictionInput<'a> {
    fn from(params: &'a GenerationParams) -> Self {
        Self {
            prompt: &params.prompt,
            duration: params.duration_secs,
            size: &params.resolution,
            negative_prompt: &params.negative_prompt,
            enable_prompt_expansion: params.expand_prompt,
        }
    }
}

/// HTTP client for Replicate
#[derive(Debug, Clone)]
pub struct ReplicateProvider {
    config: ReplicateConfig,
    client: Client,
}

impl ReplicateProvider {
    /// Create a provider with a default HTTP client
    pub fn new(config: ReplicateConfig) -> Result<Self> {
        Self::with_client(config, Client::new())
    }

    /// Create a provider reusing a configured reqwest client
    pub fn with_client(mut config: ReplicateConfig, client: Client) -> Result<Self> {
        if config.api_token.trim().is_empty() {
            return Err(ProviderError::InvalidConfig(
                "Replicate API token is empty".to_string(),
            ));
        }
        if config.model.split_once('/').is_none() {
            return Err(ProviderError::InvalidConfig(format!(
                "model '{}' must be in owner/name form",
                config.model
            )));
        }
        config.base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ReplicateConfig {
        &self.config
    }

    /// Start a prediction for the configured model
    pub async fn create_prediction(&self, params: &GenerationParams) -> Result<Prediction> {
        let url = format!(
            "{}/models/{}/predictions",
            self.config.base_url, self.config.model
        );
        let body = CreatePrediction {
            input: PredictionInput::from(params),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_token)
            .json(&body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Fetch the current state of a prediction
    pub async fn get_prediction(&self, id: &str) -> Result<Prediction> {
        let url = format!("{}/predictions/{}", self.config.base_url, id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Poll a prediction until it reaches a final state
    ///
    /// Up to `MAX_POLL_RETRIES` consecutive 5xx answers are tolerated.
    pub async fn wait_for_prediction(&self, mut prediction: Prediction) -> Result<Prediction> {
        let mut failures = 0;
        while !prediction.status.is_final() {
            tokio::time::sleep(self.config.poll_interval).await;
            match self.get_prediction(&prediction.id).await {
                Ok(next) => {
                    failures = 0;
                    prediction = next;
                    debug!("Prediction {} is {:?}", prediction.id, prediction.status);
                }
                Err(e) if e.is_server_error() && failures < MAX_POLL_RETRIES => {
                    failures += 1;
                    warn!(
                        "Polling prediction {} failed ({}/{}): {}",
                        prediction.id, failures, MAX_POLL_RETRIES, e
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(prediction)
    }

    /// Stream a video URL into `dest`
    pub async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::api_error(status.as_u16(), error_text));
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let result = async {
            let mut file = tokio::fs::File::create(dest).await?;
            while let Some(chunk) = response.chunk().await? {
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            Ok::<(), ProviderError>(())
        }
        .await;

        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(dest).await {
                debug!("Could not remove partial download {}: {}", dest.display(), e);
            }
        }
        result
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

#[async_trait]
impl VideoProvider for ReplicateProvider {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, params: &GenerationParams) -> Result<Option<PathBuf>> {
        let prediction = self.create_prediction(params).await?;
        info!(
            "Created prediction {} on {} ({}s, {})",
            prediction.id, self.config.model, params.duration_secs, params.resolution
        );

        let prediction = self.wait_for_prediction(prediction).await?;
        match prediction.status {
            PredictionStatus::Succeeded => {}
            status => {
                return Err(ProviderError::PredictionFailed {
                    id: prediction.id.clone(),
                    status: format!("{:?}", status).to_lowercase(),
                    message: prediction.error_message(),
                });
            }
        }

        let Some(url) = prediction.output_url() else {
            warn!("Prediction {} succeeded without output", prediction.id);
            return Ok(None);
        };

        let dest = self
            .config
            .download_dir
            .join(format!("{}.mp4", prediction.id));
        self.download(&url, &dest).await?;
        info!("Downloaded prediction {} to {}", prediction.id, dest.display());

        Ok(Some(dest))
    }
}
