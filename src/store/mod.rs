//! Document store: SQLite behind an r2d2 pool.
//!
//! Each call takes a pooled connection and runs independently; nothing spans
//! calls unless a method says it uses a transaction.

mod accounts;
mod models;
mod rate_limits;
mod schema;
mod tools;
mod usage;

pub use models::{
    Account, AccountProfile, AccountUpdate, DailyActivity, HistoryPage, HistoryQuery, NewAccount,
    Plan, ProfileUpdate, Role, ToolAnalytics, ToolUsageCount, UsageCounters, UsageEvent,
    UsageStatus,
};

use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::{CustomizeConnection, Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use std::fmt;
use std::path::Path;

use crate::types::{Result, StoreConfig};

pub type DbPool = Pool<SqliteConnectionManager>;

/// Connection customizer that sets per-connection SQLite pragmas.
#[derive(Debug)]
struct SqlitePragmaCustomizer;

impl CustomizeConnection<rusqlite::Connection, rusqlite::Error> for SqlitePragmaCustomizer {
    fn on_acquire(&self, conn: &mut rusqlite::Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(())
    }
}

/// Handle to the document store. Cheap to clone.
#[derive(Clone)]
pub struct Store {
    pool: DbPool,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.pool.state())
            .finish()
    }
}

impl Store {
    /// Open (or create) the database file and run migrations.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let path = Path::new(&config.database_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        tracing::info!(path = %path.display(), "Opening store");

        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(config.pool_size.max(1))
            .connection_customizer(Box::new(SqlitePragmaCustomizer))
            .build(manager)?;

        {
            let conn = pool.get()?;
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            schema::migrate(&conn)?;
        }

        tracing::info!("Store ready");
        Ok(Self { pool })
    }

    /// Private in-memory database. The pool holds a single connection so every
    /// caller sees the same database.
    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .connection_customizer(Box::new(SqlitePragmaCustomizer))
            .build(manager)?;
        {
            let conn = pool.get()?;
            schema::migrate(&conn)?;
        }
        Ok(Self { pool })
    }

    pub(crate) fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Cheap liveness probe used by `/health`.
    pub fn ping(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

// =============================================================================
// Column helpers
// =============================================================================

/// Fixed-width UTC timestamp so lexical order equals time order.
pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn parse_enum<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = crate::types::Error>,
{
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn parse_json(idx: usize, raw: &str) -> rusqlite::Result<serde_json::Value> {
    serde_json::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
