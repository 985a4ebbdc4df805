use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

mod api;
mod config;
mod error;
mod predictor;
mod ratios;
mod source;
mod store;
mod time_codec;

use api::AppState;
use config::Config;
use source::HttpRaceDataSource;
use store::SnapshotStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let source = HttpRaceDataSource::new(
        &config.ratios_url,
        config.eu_winners_url.as_deref(),
        Duration::from_secs(config.http_timeout_secs),
    )?;
    let store = SnapshotStore::new(Arc::new(source));

    // A failed initial load is not fatal: the API serves an empty snapshot
    // until POST /api/refresh succeeds.
    match store.refresh().await {
        Ok(summary) => info!(
            "Initial race data loaded: {} races, {} ratios",
            summary.races, summary.default_ratios
        ),
        Err(e) => error!("Initial race data load failed: {}", e),
    }

    if config.refresh_interval_secs > 0 {
        info!("Refreshing race data every {}s", config.refresh_interval_secs);
        store.spawn_periodic_refresh(Duration::from_secs(config.refresh_interval_secs));
    }

    let app = api::router(AppState { store });
    let addr: SocketAddr = config.api_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Race predictor API listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
