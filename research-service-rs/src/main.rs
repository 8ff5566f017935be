// research-service-rs/src/main.rs
// Research Service - HTTP entry point for trade idea generation
// Port 8000 by default (RESEARCH_SERVICE_PORT / BIND_ADDRESS override)

use std::sync::Arc;

use research_sdk::config::LoggingConfig;
use research_sdk::{ConfigProvider, FileConfigProvider, ResearchEngine};
use research_service::{logging::init_logging, ResearchService};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config_rs::load_dotenv();

    let config_provider = FileConfigProvider::from_env();
    let startup_config = config_provider.load();
    let logging = startup_config
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_else(|_| LoggingConfig::default());
    init_logging(&logging)?;

    match &startup_config {
        Ok(_) => tracing::info!("Configuration loaded from {}", config_provider.path().display()),
        Err(e) => tracing::warn!(
            "Configuration at {} is unusable, requests will get the static fallback until fixed: {}",
            config_provider.path().display(),
            e
        ),
    }

    let engine = ResearchEngine::new(Arc::new(config_provider));
    let app = Arc::new(ResearchService::new(engine)).create_router();

    let addr = config_rs::get_bind_address("research", 8000);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Research Service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
