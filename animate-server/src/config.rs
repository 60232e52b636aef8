//! Server configuration
//!
//! Every setting can be given as a command-line flag or an environment
//! variable. Intervals and limits are configurable so deployments can tune
//! them for their provider's latency and their disk budget.

use std::path::PathBuf;
use std::time::Duration;

use animate_provider::ReplicateConfig;
use axum::http::{HeaderValue, Method, header};
use clap::Parser;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::worker::WorkerConfig;

/// Server configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "animate-server")]
#[command(about = "Express Animate API server", version, long_about = None)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "ANIMATE_BIND_ADDR", default_value = "0.0.0.0:5000")]
    pub bind_addr: String,

    /// Directory for generated videos
    #[arg(long, env = "ANIMATE_GENERATED_DIR", default_value = "static/generated")]
    pub generated_dir: PathBuf,

    /// Max provider calls running at the same time
    #[arg(long, env = "ANIMATE_MAX_CONCURRENT_JOBS", default_value_t = 4)]
    pub max_concurrent_jobs: usize,

    /// Max seconds a single generation may take
    #[arg(long, env = "ANIMATE_JOB_TIMEOUT_SECS", default_value_t = 900)]
    pub job_timeout_secs: u64,

    /// Seconds finished jobs are kept (0 keeps them forever)
    #[arg(long, env = "ANIMATE_JOB_TTL_SECS", default_value_t = 86_400)]
    pub job_ttl_secs: u64,

    /// Seconds between retention sweeps
    #[arg(long, env = "ANIMATE_SWEEP_INTERVAL_SECS", default_value_t = 300)]
    pub sweep_interval_secs: u64,

    /// Seconds to wait for in-flight jobs to be recorded on shutdown
    #[arg(long, env = "ANIMATE_SHUTDOWN_GRACE_SECS", default_value_t = 10)]
    pub shutdown_grace_secs: u64,

    /// Allowed CORS origins, comma separated (empty allows any origin)
    #[arg(long, env = "ANIMATE_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Replicate API token
    #[arg(long, env = "REPLICATE_API_TOKEN", hide_env_values = true)]
    pub replicate_api_token: Option<String>,

    /// Replicate model in owner/name form
    #[arg(long, env = "REPLICATE_MODEL", default_value = animate_provider::DEFAULT_MODEL)]
    pub replicate_model: String,

    /// Replicate API base URL
    #[arg(long, env = "REPLICATE_BASE_URL", default_value = animate_provider::DEFAULT_BASE_URL)]
    pub replicate_base_url: String,

    /// Seconds between prediction status checks
    #[arg(long, env = "REPLICATE_POLL_INTERVAL_SECS", default_value_t = 2)]
    pub replicate_poll_interval_secs: u64,

    /// Use the offline mock provider instead of Replicate
    #[arg(long, env = "ANIMATE_MOCK_PROVIDER")]
    pub mock_provider: bool,
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.trim().is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.max_concurrent_jobs == 0 {
            anyhow::bail!("max_concurrent_jobs must be greater than 0");
        }

        if self.job_timeout_secs == 0 {
            anyhow::bail!("job_timeout_secs must be greater than 0");
        }

        if self.sweep_interval_secs == 0 {
            anyhow::bail!("sweep_interval_secs must be greater than 0");
        }

        if !self.mock_provider {
            let token = self.replicate_api_token.as_deref().unwrap_or_default();
            if token.trim().is_empty() {
                anyhow::bail!("REPLICATE_API_TOKEN must be set unless --mock-provider is used");
            }

            if !self.replicate_base_url.starts_with("http://")
                && !self.replicate_base_url.starts_with("https://")
            {
                anyhow::bail!("replicate_base_url must start with http:// or https://");
            }

            if self.replicate_poll_interval_secs == 0 {
                anyhow::bail!("replicate_poll_interval_secs must be greater than 0");
            }
        }

        for origin in &self.cors_origins {
            HeaderValue::from_str(origin)
                .map_err(|_| anyhow::anyhow!("invalid CORS origin: {}", origin))?;
        }

        Ok(())
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            max_concurrent_jobs: self.max_concurrent_jobs,
            job_timeout: Duration::from_secs(self.job_timeout_secs),
        }
    }

    /// Retention period, or `None` when eviction is disabled
    pub fn job_ttl(&self) -> Option<Duration> {
        (self.job_ttl_secs > 0).then(|| Duration::from_secs(self.job_ttl_secs))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Replicate settings; `None` without a token
    pub fn replicate_config(&self) -> Option<ReplicateConfig> {
        let token = self.replicate_api_token.clone()?;
        let mut config = ReplicateConfig::new(token);
        config.model = self.replicate_model.clone();
        config.base_url = self.replicate_base_url.clone();
        config.poll_interval = Duration::from_secs(self.replicate_poll_interval_secs);
        Some(config)
    }

    /// CORS policy: the listed origins, or any origin when none are listed
    pub fn cors_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .cors_origins
            .iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect();

        if origins.is_empty() {
            return CorsLayer::permissive();
        }

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
    }
}
