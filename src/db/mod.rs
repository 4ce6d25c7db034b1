//! SQLite database module

mod migrations;
mod searches;

pub use searches::RecentSearch;

use crate::error::Result;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;

/// SQLite database wrapper
pub struct SqliteDb {
    conn: Mutex<Connection>,
}

impl SqliteDb {
    /// Open (or create) the database at `path` and run migrations
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::from_connection(conn)
    }

    /// In-memory database, used by tests
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Append a search to the log and evict rows beyond the newest `cap`
    pub fn record_search(&self, symbol: &str, company: Option<&str>, cap: usize) -> Result<i64> {
        let conn = self.conn.lock();
        searches::record_search(&conn, symbol, company, cap)
    }

    /// Most recent searches, newest-first, at most `limit` rows
    pub fn recent_searches(&self, limit: usize) -> Result<Vec<RecentSearch>> {
        let conn = self.conn.lock();
        searches::recent_searches(&conn, limit)
    }

    /// Raw SQL escape hatch for tests that need to break the schema
    #[cfg(test)]
    pub(crate) fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(sql)?;
        Ok(())
    }
}
