//! Company metadata fetchers

pub mod yahoo;

pub use yahoo::YahooFetcher;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One annual revenue observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenuePoint {
    pub year: i32,
    pub revenue: Option<f64>,
}

/// Raw company attributes as the upstream provider reports them.
///
/// Every field is independently optional; upstream data gaps are expected
/// and are not errors.
#[derive(Debug, Clone, Default)]
pub struct CompanyInfo {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub net_income: Option<f64>,
    pub website: Option<String>,
    /// Chronological oldest-first, at most 5 entries
    pub revenue_history: Vec<RevenuePoint>,
    /// Diagnostic pass-through fields
    pub raw_info: serde_json::Map<String, serde_json::Value>,
}

/// Fetcher failure modes
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("symbol not found")]
    NotFound,

    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Upstream(e.to_string())
    }
}

/// Upstream provider seam. The lookup service only depends on this trait,
/// so tests substitute a canned implementation.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Result<CompanyInfo, FetchError>;
}
