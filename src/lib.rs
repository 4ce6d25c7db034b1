//! stockdash - stock research dashboard
//!
//! A small web application: looks up a ticker symbol against Yahoo Finance,
//! keeps a bounded log of recent searches in SQLite, and serves a browser UI
//! with chart rendering and CSV/XLSX/PDF export.

pub mod config;
pub mod db;
pub mod error;
pub mod fetcher;
pub mod server;
pub mod service;
pub mod state;

use config::AppConfig;
use state::AppState;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging, build state, and serve until shutdown
pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockdash=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    tracing::info!("Starting stockdash on {}:{}", config.host, config.port);

    let state = Arc::new(AppState::new(config)?);
    server::serve(state).await?;
    Ok(())
}
