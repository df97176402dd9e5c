mod api;
mod charts;
mod config;
mod db;
mod error;
mod export;
mod normalizer;
mod search;
mod state;
mod trigger;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::routes::{router, ApiState};
use crate::config::Config;
use crate::db::ResultStore;
use crate::error::Result;
use crate::state::Dashboard;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let pool = db::connect(&cfg.db_path).await?;
    let store = ResultStore::new(pool, cfg.storage_key.clone());

    if std::env::var("WEBHOOK_URL").is_err() {
        warn!("WEBHOOK_URL not set - using {}", cfg.webhook_url);
    }
    info!(
        "Webhook: {} | timeout: {}ms | storage key: {}",
        cfg.webhook_url, cfg.analysis_timeout_ms, cfg.storage_key,
    );

    // --- Application state, restored from the last persisted run ---
    let dashboard = Arc::new(Dashboard::new(cfg.clone(), store)?);
    dashboard.restore().await?;

    // --- HTTP API server ---
    let app = router(ApiState { dashboard });
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
