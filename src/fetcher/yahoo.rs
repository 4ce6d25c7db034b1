//! Yahoo Finance metadata fetcher
//!
//! Pulls company attributes from the `quoteSummary` endpoint. Yahoo wraps
//! most numbers as `{"raw": 123, "fmt": "123"}` objects and omits whole
//! modules when it has no data, so deserialization is deliberately loose:
//! a missing module or field becomes `None`, never an error.

#![allow(non_snake_case)]

use crate::fetcher::{CompanyInfo, FetchError, MetadataFetcher, RevenuePoint};
use async_trait::async_trait;
use chrono::Datelike;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer};

const BASE_URL: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";

const MODULES: &str = "price,summaryDetail,assetProfile,incomeStatementHistory";

// Yahoo rejects requests without a browser-looking user agent.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36";

/// Number of annual statements kept in the revenue history
const HISTORY_YEARS: usize = 5;

/// Yahoo Finance fetcher
pub struct YahooFetcher {
    client: Client,
}

impl YahooFetcher {
    pub fn new() -> crate::error::Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MetadataFetcher for YahooFetcher {
    async fn fetch(&self, symbol: &str) -> Result<CompanyInfo, FetchError> {
        let url = format!(
            "{}/{}?modules={}",
            BASE_URL,
            urlencoding::encode(symbol),
            MODULES
        );

        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if !response.status().is_success() {
            return Err(FetchError::Upstream(format!(
                "quoteSummary returned HTTP {}",
                response.status()
            )));
        }

        let envelope: QuoteSummaryEnvelope = response
            .json()
            .await
            .map_err(|e| FetchError::Upstream(format!("invalid quoteSummary payload: {}", e)))?;

        parse_quote_summary(envelope)
    }
}

/// Turn a decoded envelope into `CompanyInfo`
fn parse_quote_summary(envelope: QuoteSummaryEnvelope) -> Result<CompanyInfo, FetchError> {
    let summary = envelope.quoteSummary;

    if let Some(err) = summary.error {
        let description = err
            .description
            .or(err.code)
            .unwrap_or_else(|| "unknown upstream error".to_string());
        return if description.to_lowercase().contains("not found") {
            Err(FetchError::NotFound)
        } else {
            Err(FetchError::Upstream(description))
        };
    }

    let modules = summary
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or(FetchError::NotFound)?;

    let price = modules.price.unwrap_or_default();
    let detail = modules.summaryDetail.unwrap_or_default();
    let profile = modules.assetProfile.unwrap_or_default();
    let statements = modules
        .incomeStatementHistory
        .map(|h| h.incomeStatementHistory)
        .unwrap_or_default();

    // Statements arrive most-recent-first; keep the newest few and flip to
    // chronological order for the chart and export.
    let mut revenue_history: Vec<RevenuePoint> = statements
        .iter()
        .filter_map(|s| {
            let year = chrono::DateTime::from_timestamp(s.endDate? as i64, 0)?.year();
            Some(RevenuePoint {
                year,
                revenue: s.totalRevenue,
            })
        })
        .take(HISTORY_YEARS)
        .collect();
    revenue_history.reverse();

    let net_income = statements.iter().find_map(|s| s.netIncome);

    let mut raw_info = serde_json::Map::new();
    raw_info.insert(
        "longBusinessSummary".to_string(),
        profile.longBusinessSummary.clone().into(),
    );
    raw_info.insert("website".to_string(), profile.website.clone().into());
    raw_info.insert("exchange".to_string(), price.exchangeName.clone().into());
    raw_info.insert(
        "fullTimeEmployees".to_string(),
        profile.fullTimeEmployees.into(),
    );

    Ok(CompanyInfo {
        name: price.shortName.or(price.longName),
        sector: profile.sector,
        market_cap: price.marketCap.or(detail.marketCap),
        pe_ratio: detail.trailingPE.or(detail.forwardPE),
        net_income,
        website: profile.website,
        revenue_history,
        raw_info,
    })
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    quoteSummary: QuoteSummaryBody,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryBody {
    result: Option<Vec<QuoteModules>>,
    error: Option<UpstreamError>,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuoteModules {
    price: Option<PriceModule>,
    summaryDetail: Option<SummaryDetailModule>,
    assetProfile: Option<AssetProfileModule>,
    incomeStatementHistory: Option<IncomeStatementHistoryModule>,
}

#[derive(Debug, Default, Deserialize)]
struct PriceModule {
    shortName: Option<String>,
    longName: Option<String>,
    exchangeName: Option<String>,
    #[serde(default, deserialize_with = "de_yahoo_number")]
    marketCap: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryDetailModule {
    #[serde(default, deserialize_with = "de_yahoo_number")]
    trailingPE: Option<f64>,
    #[serde(default, deserialize_with = "de_yahoo_number")]
    forwardPE: Option<f64>,
    #[serde(default, deserialize_with = "de_yahoo_number")]
    marketCap: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct AssetProfileModule {
    sector: Option<String>,
    website: Option<String>,
    longBusinessSummary: Option<String>,
    fullTimeEmployees: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct IncomeStatementHistoryModule {
    #[serde(default)]
    incomeStatementHistory: Vec<IncomeStatement>,
}

#[derive(Debug, Deserialize)]
struct IncomeStatement {
    #[serde(default, deserialize_with = "de_yahoo_number")]
    endDate: Option<f64>,
    #[serde(default, deserialize_with = "de_yahoo_number")]
    totalRevenue: Option<f64>,
    #[serde(default, deserialize_with = "de_yahoo_number")]
    netIncome: Option<f64>,
}

/// Deserialize a Yahoo number that may be a `{raw, fmt}` object, a bare
/// number, a numeric string, an empty object, or null
fn de_yahoo_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum YahooNumber {
        Wrapped {
            #[serde(default)]
            raw: Option<f64>,
        },
        Num(f64),
        Str(String),
    }

    match Option::<YahooNumber>::deserialize(deserializer)? {
        Some(YahooNumber::Wrapped { raw }) => Ok(raw),
        Some(YahooNumber::Num(n)) => Ok(Some(n)),
        Some(YahooNumber::Str(s)) if s.is_empty() => Ok(None),
        Some(YahooNumber::Str(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
