//! Runtime configuration
//!
//! Everything is read from the environment with sensible local-development
//! defaults, so `cargo run` works with no setup.

use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// SQLite database path
    pub db_path: PathBuf,
    /// Retention cap for the recent-search log (rows beyond this are evicted
    /// oldest-first at write time)
    pub recent_cap: usize,
    /// Default number of entries returned by /api/recent
    pub recent_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            db_path: PathBuf::from("searches.db"),
            recent_cap: 25,
            recent_limit: 10,
        }
    }
}

impl AppConfig {
    /// Build configuration from `STOCKDASH_*` environment variables, falling
    /// back to defaults. Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("STOCKDASH_HOST") {
            config.host = host;
        }
        if let Some(port) = parse_var("STOCKDASH_PORT") {
            config.port = port;
        }
        if let Ok(path) = std::env::var("STOCKDASH_DB") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(cap) = parse_var::<usize>("STOCKDASH_RECENT_CAP") {
            config.recent_cap = cap.max(1);
        }
        if let Some(limit) = parse_var("STOCKDASH_RECENT_LIMIT") {
            config.recent_limit = limit;
        }

        config
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring unparseable {}={:?}", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.recent_cap, 25);
        assert_eq!(config.recent_limit, 10);
        assert_eq!(config.db_path, PathBuf::from("searches.db"));
    }
}
