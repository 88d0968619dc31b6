//! Wagerboard backend
//!
//! Proxies the Rainbet and Betbolt affiliate APIs, masks usernames, keeps the
//! top ten by wager and caches each month's board per platform.

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wagerboard_backend::api::{create_router, AppState};
use wagerboard_backend::config::Config;
use wagerboard_backend::leaderboard::SystemClock;

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let config = Config::parse();
    info!(
        rainbet = config.rainbet_key().is_some(),
        betbolt = config.betbolt_bearer().is_some(),
        rainbet_ttl_secs = config.rainbet_cache_ttl_secs,
        betbolt_ttl_secs = config.betbolt_cache_ttl_secs,
        wager_parsing = ?config.wager_parsing,
        "Starting wagerboard backend"
    );

    let state = AppState::from_config(&config, Arc::new(SystemClock))
        .context("Failed to build upstream clients")?;
    let app = create_router(state);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "wagerboard=debug,wagerboard_backend=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    let _ = dotenv();

    // Also try the crate root when launched from elsewhere
    let p = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if p.exists() {
        let _ = dotenv::from_path(&p);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
