use std::sync::Arc;
use std::time::Duration;

use animate_provider::{MockProvider, ReplicateProvider, VideoProvider};
use animate_server::api;
use animate_server::config::Config;
use animate_server::repository::InMemoryJobStore;
use animate_server::service::JobService;
use animate_server::storage::ArtifactStorage;
use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MOCK_DELAY: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "animate_server=debug,animate_provider=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Express Animate server...");

    let config = Config::parse();
    config.validate().context("Invalid configuration")?;

    let provider = build_provider(&config)?;
    tracing::info!("Using video provider: {}", provider.name());

    let storage = ArtifactStorage::new(&config.generated_dir);
    storage.ensure_dir().await.with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.generated_dir.display()
        )
    })?;

    let service = Arc::new(JobService::new(
        Arc::new(InMemoryJobStore::new()),
        provider,
        storage,
        config.worker_config(),
    ));

    match config.job_ttl() {
        Some(ttl) => {
            service.spawn_sweeper(ttl, config.sweep_interval());
        }
        None => tracing::info!("Job eviction disabled"),
    }

    let app = api::create_router(Arc::clone(&service), config.cors_layer());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down, waiting for in-flight jobs...");
    service.shutdown(config.shutdown_grace()).await;
    tracing::info!("Server stopped");

    Ok(())
}

fn build_provider(config: &Config) -> anyhow::Result<Arc<dyn VideoProvider>> {
    if config.mock_provider {
        let output_dir = std::env::temp_dir().join("express-animate-mock");
        return Ok(Arc::new(MockProvider::new(MOCK_DELAY, output_dir)));
    }

    let replicate = config
        .replicate_config()
        .context("REPLICATE_API_TOKEN is not set")?;
    tracing::info!(
        "Replicate model: {} ({})",
        replicate.model,
        replicate.base_url
    );

    let provider =
        ReplicateProvider::new(replicate).context("Failed to create Replicate provider")?;
    Ok(Arc::new(provider))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
