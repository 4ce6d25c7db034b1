//! Application state management

use crate::config::AppConfig;
use crate::db::SqliteDb;
use crate::error::{AppError, Result};
use crate::fetcher::{MetadataFetcher, YahooFetcher};
use crate::service::lookup::LookupResult;
use dashmap::DashMap;
use std::sync::Arc;

/// Application state shared across all request handlers
pub struct AppState {
    /// SQLite database holding the recent-search log
    pub db: Arc<SqliteDb>,

    /// Upstream company metadata provider
    pub fetcher: Arc<dyn MetadataFetcher>,

    /// Last successful lookup per symbol, reused by export so the file
    /// matches what the user saw. Bounded by `config.recent_cap`; evicted
    /// symbols fall back to a fresh fetch on export.
    pub snapshots: DashMap<String, LookupResult>,

    /// Runtime configuration
    pub config: AppConfig,
}

impl AppState {
    /// Create application state with the real Yahoo fetcher
    pub fn new(config: AppConfig) -> Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Config(format!(
                        "Failed to create data directory {:?}: {}",
                        parent, e
                    ))
                })?;
            }
        }

        tracing::info!("Database path: {:?}", config.db_path);
        let db = Arc::new(SqliteDb::open(&config.db_path)?);
        let fetcher = Arc::new(YahooFetcher::new()?);

        Ok(Self {
            db,
            fetcher,
            snapshots: DashMap::new(),
            config,
        })
    }

    /// State backed by an in-memory database and a caller-supplied fetcher,
    /// used by tests
    pub fn with_fetcher(fetcher: Arc<dyn MetadataFetcher>, config: AppConfig) -> Result<Self> {
        Ok(Self {
            db: Arc::new(SqliteDb::open_in_memory()?),
            fetcher,
            snapshots: DashMap::new(),
            config,
        })
    }
}
