use anyhow::{Context, Result};
use dotenv::dotenv;
use etf_core::{EtfService, TickerCatalog, YahooFinanceClient};
use etf_service_rust::{create_app, AppState, ServiceConfig};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!("Starting ETF Service...");

    let config = ServiceConfig::from_env().context("Invalid configuration")?;

    // Catalog
    let catalog = TickerCatalog::load(&config.tickers_path, &config.meta_path);
    if catalog.is_empty() {
        warn!("Ticker catalog is empty, /api/etfs will return no rows");
    }

    // Provider
    let provider = YahooFinanceClient::with_config(&config.yahoo_base_url, config.provider_timeout())
        .context("Failed to initialize Yahoo Finance client")?;

    let service = EtfService::with_ttl(Arc::new(catalog), Arc::new(provider), config.cache_ttl());
    let app = create_app(AppState::new(service));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        "ETF Service listening on {} (cache TTL {}s)",
        addr, config.cache_ttl_secs
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("ETF Service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
