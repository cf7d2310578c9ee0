// analysis-gateway-rs/src/main.rs
// Analysis Gateway - HTTP entry point for ReLiveAI regret analysis
// Port 8000 by default (ANALYSIS_GATEWAY_SERVICE_PORT / _SERVICE_ADDR)

use std::sync::Arc;

use analysis_gateway::{AnalysisGateway, SERVICE_NAME};
use analysis_sdk::config::{self, AnalysisConfig, ProviderConfig};
use analysis_sdk::RegretAnalyzer;
use anyhow::Context;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let provider = config::default_provider();
    let provider_config = ProviderConfig::from_provider(&provider).context("invalid provider configuration")?;
    let analysis_config = AnalysisConfig::from_provider(&provider).context("invalid analysis configuration")?;

    if !provider_config.is_configured() {
        tracing::warn!("No provider API key configured (RELIVE_LLM_API_KEY or OPENAI_API_KEY); analyses will fail until one is set");
    }
    tracing::info!(
        models = ?analysis_config.models,
        max_attempts = analysis_config.max_attempts,
        graceful_degradation = analysis_config.graceful_degradation,
        "Analysis pipeline configured"
    );

    let analyzer = RegretAnalyzer::from_config(provider_config, analysis_config)
        .context("failed to build analyzer")?;
    let app = Arc::new(AnalysisGateway::new(analyzer)).create_router();

    let addr = config_rs::get_bind_address("ANALYSIS_GATEWAY", 8000);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("{} listening on {}", SERVICE_NAME, addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("{} stopped", SERVICE_NAME);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
