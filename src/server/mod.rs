//! HTTP server
//!
//! Routes:
//! - GET /                       -> embedded frontend
//! - GET /api/recent             -> recent searches from SQLite
//! - GET /api/{symbol}           -> financial data for a symbol
//! - GET /export/{symbol}        -> CSV/XLSX attachment (?format=csv|xlsx)

mod assets;
mod handlers;

use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(assets::index))
        .route("/static/app.js", get(assets::app_js))
        .route("/static/style.css", get(assets::style_css))
        // Static /api/recent wins over the /api/:symbol capture
        .route("/api/recent", get(handlers::recent))
        .route("/api/:symbol", get(handlers::lookup_symbol))
        .route("/export/:symbol", get(handlers::export_symbol))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process exits
pub async fn serve(state: Arc<AppState>) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", state.config.host, state.config.port)
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid bind address: {}", e)))?;

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
