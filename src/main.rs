//! rssdepot — Binary Entrypoint
//! Boots the Axum HTTP server and the background refresh loop.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rssdepot::api::{self, AppState};
use rssdepot::config::Config;
use rssdepot::fetch::FetchGateway;
use rssdepot::metrics::Metrics;
use rssdepot::scheduler::{spawn_refresh_loop, FeedCache};
use rssdepot::sources;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rssdepot=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::from_env()?;
    let metrics = Metrics::init();

    let state = AppState {
        feeds: Arc::new(sources::registry()),
        gateway: Arc::new(FetchGateway::new(config.relay_url.clone())),
        cache: Arc::new(FeedCache::new()),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = spawn_refresh_loop(state.clone(), config.refresh_secs, shutdown_rx);

    let router = api::create_router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    tracing::info!(addr = %config.addr, refresh_secs = config.refresh_secs, "serving feeds");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("http server")?;

    // Stop the refresh loop; its in-flight fetches are bounded by their own
    // timeouts, so this cannot hang indefinitely.
    let _ = shutdown_tx.send(true);
    scheduler.await.context("joining refresh loop")?;
    Ok(())
}
