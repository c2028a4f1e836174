//! Usage event log and its aggregates.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use super::accounts::increment_usage_on;
use super::models::{
    DailyActivity, HistoryPage, HistoryQuery, ToolAnalytics, ToolUsageCount, UsageCounters,
    UsageEvent, UsageStatus,
};
use super::{format_ts, parse_enum, parse_json, parse_ts, Store};
use crate::types::{AccountId, Result, UsageEventId};

const EVENT_COLUMNS: &str = "id, account_id, tool_slug, tool_name, category, input, output, \
     tokens_used, execution_time, status, error, created_at";

fn text_conversion(idx: usize, e: &'static str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
}

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<UsageEvent> {
    let id: String = row.get(0)?;
    let account_id: String = row.get(1)?;
    let input: String = row.get(5)?;
    let output: Option<String> = row.get(6)?;
    let status: String = row.get(9)?;
    let created_at: String = row.get(11)?;

    Ok(UsageEvent {
        id: UsageEventId::from_string(id).map_err(|e| text_conversion(0, e))?,
        user_id: AccountId::from_string(account_id).map_err(|e| text_conversion(1, e))?,
        tool_slug: row.get(2)?,
        tool_name: row.get(3)?,
        category: row.get(4)?,
        input: parse_json(5, &input)?,
        output: output.as_deref().map(|s| parse_json(6, s)).transpose()?,
        tokens_used: row.get(7)?,
        execution_time: row.get(8)?,
        status: parse_enum::<UsageStatus>(9, &status)?,
        error: row.get(10)?,
        created_at: parse_ts(11, &created_at)?,
    })
}

fn insert_event(conn: &Connection, event: &UsageEvent) -> Result<()> {
    let output = event
        .output
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    conn.execute(
        "INSERT INTO usage_events
         (id, account_id, tool_slug, tool_name, category, input, output,
          tokens_used, execution_time, status, error, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            event.id.as_str(),
            event.user_id.as_str(),
            event.tool_slug,
            event.tool_name,
            event.category,
            serde_json::to_string(&event.input)?,
            output,
            event.tokens_used,
            event.execution_time,
            event.status.as_str(),
            event.error,
            format_ts(event.created_at),
        ],
    )?;
    Ok(())
}

impl Store {
    /// Append one usage event.
    pub fn append_event(&self, event: &UsageEvent) -> Result<()> {
        let conn = self.conn()?;
        insert_event(&conn, event)
    }

    /// Append a success event and bump its category counter in a single
    /// transaction.
    pub fn append_success_with_increment(&self, event: &UsageEvent) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        insert_event(&tx, event)?;
        increment_usage_on(&tx, event.user_id.as_str(), &event.category)?;
        tx.commit()?;
        Ok(())
    }

    /// One page of an account's events, newest first, optionally filtered by
    /// tool display name.
    pub fn list_events(&self, account: &AccountId, query: &HistoryQuery) -> Result<HistoryPage> {
        let conn = self.conn()?;
        let limit = query.limit.max(1);
        let page = query.page.max(1);
        let offset = i64::from(page - 1) * i64::from(limit);

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM usage_events
             WHERE account_id = ?1 AND (?2 IS NULL OR tool_name = ?2)",
            params![account.as_str(), query.tool],
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {} FROM usage_events
             WHERE account_id = ?1 AND (?2 IS NULL OR tool_name = ?2)
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?3 OFFSET ?4",
            EVENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(
                params![account.as_str(), query.tool, i64::from(limit), offset],
                row_to_event,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(HistoryPage {
            items,
            total: u64::try_from(total).unwrap_or_default(),
            page,
            limit,
        })
    }

    /// Delete an event owned by `account`. Returns `false` when no such event
    /// exists for that account.
    pub fn delete_event(&self, account: &AccountId, id: &UsageEventId) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM usage_events WHERE id = ?1 AND account_id = ?2",
            params![id.as_str(), account.as_str()],
        )?;
        Ok(deleted > 0)
    }

    pub fn count_events(&self, account: &AccountId) -> Result<u64> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM usage_events WHERE account_id = ?1",
            params![account.as_str()],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(total).unwrap_or_default())
    }

    /// Event counts per tool display name, most used first.
    pub fn usage_by_tool(&self, account: &AccountId) -> Result<Vec<ToolUsageCount>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT tool_name, COUNT(*) AS n FROM usage_events
             WHERE account_id = ?1
             GROUP BY tool_name
             ORDER BY n DESC, tool_name ASC",
        )?;
        let rows = stmt
            .query_map(params![account.as_str()], |row| {
                Ok(ToolUsageCount {
                    tool: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Event counts per UTC day since `since`, oldest day first.
    pub fn recent_activity(
        &self,
        account: &AccountId,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyActivity>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT substr(created_at, 1, 10) AS day, COUNT(*) FROM usage_events
             WHERE account_id = ?1 AND created_at >= ?2
             GROUP BY day
             ORDER BY day ASC",
        )?;
        let rows = stmt
            .query_map(params![account.as_str(), format_ts(since)], |row| {
                Ok(DailyActivity {
                    date: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Successful events per usage category; the value counters should hold.
    pub fn success_counts_by_category(&self, account: &AccountId) -> Result<UsageCounters> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT category, COUNT(*) FROM usage_events
             WHERE account_id = ?1 AND status = 'success'
             GROUP BY category",
        )?;
        let rows = stmt.query_map(params![account.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        Ok(rows.collect::<rusqlite::Result<UsageCounters>>()?)
    }

    /// Per-tool totals across every account.
    pub fn tool_analytics(&self) -> Result<Vec<ToolAnalytics>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT tool_slug, MAX(tool_name),
                    SUM(CASE WHEN status = 'success' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END),
                    COALESCE(SUM(tokens_used), 0),
                    COALESCE(AVG(execution_time), 0.0)
             FROM usage_events
             GROUP BY tool_slug
             ORDER BY tool_slug",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ToolAnalytics {
                    tool_slug: row.get(0)?,
                    tool_name: row.get(1)?,
                    successes: row.get(2)?,
                    failures: row.get(3)?,
                    tokens_used: row.get(4)?,
                    avg_execution_time: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
