//! Recent-search log
//!
//! Append-only log of successful lookups, trimmed to a retention cap at
//! write time so the table itself never grows past the cap. Rows are never
//! updated in place.

use crate::error::Result;
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

/// A persisted search entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentSearch {
    pub id: i64,
    pub symbol: String,
    pub company: Option<String>,
    pub timestamp: String,
}

/// Insert a search and evict everything beyond the newest `cap` rows.
///
/// Both statements run under the caller's connection lock, so a concurrent
/// append can never observe the table above the cap.
pub fn record_search(
    conn: &Connection,
    symbol: &str,
    company: Option<&str>,
    cap: usize,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO searches (symbol, company, timestamp) VALUES (?1, ?2, ?3)",
        params![symbol, company, Utc::now().to_rfc3339()],
    )?;
    let id = conn.last_insert_rowid();

    conn.execute(
        "DELETE FROM searches
         WHERE id NOT IN (SELECT id FROM searches ORDER BY id DESC LIMIT ?1)",
        params![cap as i64],
    )?;

    Ok(id)
}

/// Most recent searches, newest-first
pub fn recent_searches(conn: &Connection, limit: usize) -> Result<Vec<RecentSearch>> {
    let mut stmt = conn.prepare(
        "SELECT id, symbol, company, timestamp
         FROM searches
         ORDER BY id DESC
         LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit as i64], |row| {
        Ok(RecentSearch {
            id: row.get(0)?,
            symbol: row.get(1)?,
            company: row.get(2)?,
            timestamp: row.get(3)?,
        })
    })?;

    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteDb;
    use tempfile::tempdir;

    #[test]
    fn test_record_and_read_newest_first() {
        let db = SqliteDb::open_in_memory().unwrap();

        db.record_search("AAPL", Some("Apple Inc."), 10).unwrap();
        db.record_search("MSFT", Some("Microsoft Corporation"), 10)
            .unwrap();
        db.record_search("TSLA", None, 10).unwrap();

        let recent = db.recent_searches(10).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].symbol, "TSLA");
        assert_eq!(recent[1].symbol, "MSFT");
        assert_eq!(recent[2].symbol, "AAPL");
        assert_eq!(recent[0].company, None);
        assert_eq!(recent[2].company.as_deref(), Some("Apple Inc."));
    }

    #[test]
    fn test_retention_cap_evicts_oldest() {
        let db = SqliteDb::open_in_memory().unwrap();
        let cap = 5;

        for i in 0..=cap {
            db.record_search(&format!("SYM{}", i), None, cap).unwrap();
        }

        // cap + 1 inserts leave exactly cap rows, the newest ones
        let recent = db.recent_searches(100).unwrap();
        assert_eq!(recent.len(), cap);
        assert_eq!(recent[0].symbol, format!("SYM{}", cap));
        assert_eq!(recent[cap - 1].symbol, "SYM1");
        assert!(!recent.iter().any(|r| r.symbol == "SYM0"));
    }

    #[test]
    fn test_read_limit() {
        let db = SqliteDb::open_in_memory().unwrap();
        for i in 0..8 {
            db.record_search(&format!("SYM{}", i), None, 25).unwrap();
        }
        let recent = db.recent_searches(3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].symbol, "SYM7");
    }

    #[test]
    fn test_timestamps_are_rfc3339() {
        let db = SqliteDb::open_in_memory().unwrap();
        db.record_search("AAPL", None, 10).unwrap();
        let recent = db.recent_searches(1).unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&recent[0].timestamp).is_ok());
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("searches.db");

        {
            let db = SqliteDb::open(&path).unwrap();
            db.record_search("AAPL", Some("Apple Inc."), 10).unwrap();
        }

        // Reopen and confirm the row survived, with migrations idempotent
        let db = SqliteDb::open(&path).unwrap();
        let recent = db.recent_searches(10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].symbol, "AAPL");
    }
}
