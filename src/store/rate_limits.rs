//! Shared fixed-window counters for the store-backed rate limiter.

use rusqlite::params;

use super::Store;
use crate::types::Result;

impl Store {
    /// Count one hit against `key` in the window starting at `window_start`
    /// (epoch millis). A row left over from an earlier window is reset.
    /// Returns the count including this hit.
    pub fn hit_window(&self, key: &str, window_start: i64) -> Result<u32> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "INSERT INTO rate_limit_windows (key, window_start, count) VALUES (?1, ?2, 1)
             ON CONFLICT(key) DO UPDATE SET
                 count = CASE WHEN window_start = excluded.window_start
                              THEN count + 1 ELSE 1 END,
                 window_start = excluded.window_start
             RETURNING count",
            params![key, window_start],
            |row| row.get(0),
        )?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    /// Give back one hit, if the window is still current.
    pub fn release_window(&self, key: &str, window_start: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE rate_limit_windows SET count = MAX(count - 1, 0)
             WHERE key = ?1 AND window_start = ?2",
            params![key, window_start],
        )?;
        Ok(())
    }

    /// Drop windows that started before `before` (epoch millis).
    pub fn prune_windows(&self, before: i64) -> Result<usize> {
        let conn = self.conn()?;
        Ok(conn.execute(
            "DELETE FROM rate_limit_windows WHERE window_start < ?1",
            params![before],
        )?)
    }
}
