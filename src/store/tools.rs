//! Tool table: seeding and read access.

use rusqlite::{params, OptionalExtension, Row};

use super::{format_ts, parse_enum, parse_json, parse_ts, Store};
use crate::tools::{ToolCategory, ToolDefinition, ToolKind, UsageLimits};
use crate::types::Result;

const TOOL_COLUMNS: &str = "slug, name, description, category, kind, icon, features, \
     limit_free, limit_pro, limit_enterprise, is_active, created_at";

fn row_to_tool(row: &Row<'_>) -> rusqlite::Result<ToolDefinition> {
    let category: String = row.get(3)?;
    let kind: String = row.get(4)?;
    let features: String = row.get(6)?;
    let created_at: String = row.get(11)?;

    let features = match parse_json(6, &features)? {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };

    Ok(ToolDefinition {
        slug: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category: parse_enum::<ToolCategory>(3, &category)?,
        kind: parse_enum::<ToolKind>(4, &kind)?,
        icon: row.get(5)?,
        features,
        usage_limits: UsageLimits {
            free: row.get(7)?,
            pro: row.get(8)?,
            enterprise: row.get(9)?,
        },
        is_active: row.get(10)?,
        created_at: parse_ts(11, &created_at)?,
    })
}

impl Store {
    /// Insert definitions whose slug is not yet present. Existing rows are
    /// left untouched. Returns the number of rows inserted.
    pub fn seed_tools(&self, definitions: &[ToolDefinition]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO tools
                 (slug, name, description, category, kind, icon, features,
                  limit_free, limit_pro, limit_enterprise, is_active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;
            for def in definitions {
                def.validate()?;
                inserted += stmt.execute(params![
                    def.slug,
                    def.name,
                    def.description,
                    def.category.as_str(),
                    def.kind.as_str(),
                    def.icon,
                    serde_json::to_string(&def.features)?,
                    def.usage_limits.free,
                    def.usage_limits.pro,
                    def.usage_limits.enterprise,
                    def.is_active,
                    format_ts(def.created_at),
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!(inserted, total = definitions.len(), "Seeded tool catalog");
        Ok(inserted)
    }

    pub fn find_tool(&self, slug: &str) -> Result<Option<ToolDefinition>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM tools WHERE slug = ?1", TOOL_COLUMNS);
        Ok(conn.query_row(&sql, params![slug], row_to_tool).optional()?)
    }

    /// Tool definitions ordered by slug.
    pub fn list_tools(&self, include_inactive: bool) -> Result<Vec<ToolDefinition>> {
        let conn = self.conn()?;
        let sql = if include_inactive {
            format!("SELECT {} FROM tools ORDER BY slug", TOOL_COLUMNS)
        } else {
            format!(
                "SELECT {} FROM tools WHERE is_active = 1 ORDER BY slug",
                TOOL_COLUMNS
            )
        };
        let mut stmt = conn.prepare(&sql)?;
        let tools = stmt
            .query_map([], row_to_tool)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tools)
    }
}
