//! Idempotent schema creation.

use rusqlite::Connection;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id              TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    email           TEXT NOT NULL UNIQUE,
    password_hash   TEXT NOT NULL,
    role            TEXT NOT NULL DEFAULT 'user',
    plan            TEXT NOT NULL DEFAULT 'free',
    profile_image   TEXT,
    email_verified  INTEGER NOT NULL DEFAULT 0,
    is_active       INTEGER NOT NULL DEFAULT 1,
    last_login      TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS account_usage (
    account_id  TEXT NOT NULL REFERENCES accounts(id),
    category    TEXT NOT NULL,
    count       INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (account_id, category)
);

CREATE TABLE IF NOT EXISTS tools (
    slug              TEXT PRIMARY KEY,
    name              TEXT NOT NULL UNIQUE,
    description       TEXT NOT NULL,
    category          TEXT NOT NULL,
    kind              TEXT NOT NULL,
    icon              TEXT NOT NULL,
    features          TEXT NOT NULL,
    limit_free        INTEGER NOT NULL,
    limit_pro         INTEGER NOT NULL,
    limit_enterprise  INTEGER NOT NULL,
    is_active         INTEGER NOT NULL DEFAULT 1,
    created_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS usage_events (
    id              TEXT PRIMARY KEY,
    account_id      TEXT NOT NULL,
    tool_slug       TEXT NOT NULL,
    tool_name       TEXT NOT NULL,
    category        TEXT NOT NULL,
    input           TEXT NOT NULL,
    output          TEXT,
    tokens_used     INTEGER NOT NULL DEFAULT 0,
    execution_time  REAL NOT NULL DEFAULT 0,
    status          TEXT NOT NULL,
    error           TEXT,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_usage_events_account_created
    ON usage_events (account_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_usage_events_tool_created
    ON usage_events (tool_slug, created_at DESC);

CREATE TABLE IF NOT EXISTS rate_limit_windows (
    key           TEXT PRIMARY KEY,
    window_start  INTEGER NOT NULL,
    count         INTEGER NOT NULL
);
";

/// Create all tables and indexes if they do not exist.
pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 5);
    }
}
