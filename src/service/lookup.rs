//! Symbol lookup orchestration: fetch, normalize, log, snapshot

use crate::db::RecentSearch;
use crate::error::{AppError, Result};
use crate::fetcher::{CompanyInfo, FetchError, RevenuePoint};
use crate::state::AppState;
use serde::Serialize;
use tracing::warn;
use url::Url;

/// Normalized lookup response.
///
/// Every financial field is an explicit `Option` serialized as an
/// always-present JSON key (`null` when upstream omitted it), so clients
/// never have to distinguish a missing key from a null.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    pub symbol: String,
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub latest_annual_report_link: Option<String>,
    pub revenue_history: Vec<RevenuePoint>,
    pub raw_info: serde_json::Map<String, serde_json::Value>,
}

impl LookupResult {
    /// True when upstream resolved the symbol but supplied none of the
    /// scalar fields - treated as not found
    fn has_no_data(&self) -> bool {
        self.market_cap.is_none()
            && self.revenue.is_none()
            && self.net_income.is_none()
            && self.pe_ratio.is_none()
            && self.sector.is_none()
    }
}

/// Response body for `/api/recent`
#[derive(Debug, Serialize)]
pub struct RecentResponse {
    pub recent: Vec<RecentSearch>,
}

fn not_found_message(symbol: &str) -> String {
    format!(
        "No data found for symbol '{}'. Please check the symbol and try again.",
        symbol
    )
}

/// Look up a symbol: normalize the input, fetch from upstream, record the
/// search, and cache the result for export reuse.
pub async fn lookup(state: &AppState, raw_symbol: &str) -> Result<LookupResult> {
    let symbol = raw_symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AppError::Validation("Symbol required".to_string()));
    }

    let info = state.fetcher.fetch(&symbol).await.map_err(|e| match e {
        FetchError::NotFound => AppError::NotFound(not_found_message(&symbol)),
        FetchError::Upstream(msg) => AppError::Upstream(msg),
    })?;

    let result = normalize(&symbol, info);
    if result.has_no_data() {
        return Err(AppError::NotFound(not_found_message(&symbol)));
    }

    // Logging the search must never fail the lookup; failures are surfaced
    // in the logs only.
    if let Err(e) = state.db.record_search(
        &symbol,
        result.company_name.as_deref(),
        state.config.recent_cap,
    ) {
        warn!(symbol = %symbol, error = %e, "Failed to record search, continuing");
    }

    // The snapshot cache is bounded by the same cap as the search log; an
    // evicted symbol just costs export a fresh fetch.
    if !state.snapshots.contains_key(&symbol) && state.snapshots.len() >= state.config.recent_cap {
        let stale = state.snapshots.iter().map(|e| e.key().clone()).next();
        if let Some(stale) = stale {
            state.snapshots.remove(&stale);
        }
    }
    state.snapshots.insert(symbol, result.clone());
    Ok(result)
}

/// Read the recent-search log. A read failure degrades to an empty list.
pub fn recent(state: &AppState, limit: usize) -> RecentResponse {
    let recent = state.db.recent_searches(limit).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to read recent searches, returning empty list");
        Vec::new()
    });
    RecentResponse { recent }
}

/// Shape raw upstream attributes into the response contract
fn normalize(symbol: &str, info: CompanyInfo) -> LookupResult {
    // Most recent year with a reported revenue figure
    let revenue = info
        .revenue_history
        .iter()
        .rev()
        .find_map(|p| p.revenue);

    // Company website when it parses as a URL, otherwise point the user at
    // SEC full-text search for the symbol.
    let latest_annual_report_link = info
        .website
        .as_deref()
        .filter(|w| Url::parse(w).is_ok())
        .map(str::to_string)
        .or_else(|| Some(format!("https://www.sec.gov/edgar/search/#/q={}", symbol)));

    LookupResult {
        symbol: symbol.to_string(),
        company_name: info.name.or_else(|| Some(symbol.to_string())),
        sector: info.sector,
        market_cap: info.market_cap,
        pe_ratio: info.pe_ratio,
        revenue,
        net_income: info.net_income,
        latest_annual_report_link,
        revenue_history: info.revenue_history,
        raw_info: info.raw_info,
    }
}
