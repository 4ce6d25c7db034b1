//! API endpoint handlers

use crate::error::Result;
use crate::service::export::{self, ExportFile};
use crate::service::lookup::{self, LookupResult, RecentResponse};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// GET /api/{symbol}
pub async fn lookup_symbol(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<LookupResult>> {
    info!(symbol = %symbol, "Lookup request");
    let result = lookup::lookup(&state, &symbol).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    limit: Option<usize>,
}

/// GET /api/recent
pub async fn recent(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentQuery>,
) -> Json<RecentResponse> {
    let limit = query.limit.unwrap_or(state.config.recent_limit);
    Json(lookup::recent(&state, limit))
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    format: Option<String>,
}

/// GET /export/{symbol}?format=csv|xlsx
pub async fn export_symbol(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response> {
    info!(symbol = %symbol, format = ?query.format, "Export request");
    let ExportFile {
        filename,
        content_type,
        bytes,
    } = export::export(&state, &symbol, query.format.as_deref()).await?;

    let headers = [
        (header::CONTENT_TYPE, content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];

    Ok((headers, bytes).into_response())
}
