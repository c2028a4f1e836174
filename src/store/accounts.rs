//! Account persistence and usage counters.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::{Account, AccountUpdate, NewAccount, Plan, ProfileUpdate, Role, UsageCounters};
use super::{format_ts, parse_enum, parse_ts, Store};
use crate::types::{AccountId, Error, Result};

const ACCOUNT_COLUMNS: &str = "id, name, email, password_hash, role, plan, profile_image, \
     email_verified, is_active, last_login, created_at, updated_at";

fn row_to_account(row: &Row<'_>) -> rusqlite::Result<Account> {
    let id: String = row.get(0)?;
    let role: String = row.get(4)?;
    let plan: String = row.get(5)?;
    let last_login: Option<String> = row.get(9)?;
    let created_at: String = row.get(10)?;
    let updated_at: String = row.get(11)?;

    Ok(Account {
        id: AccountId::from_string(id).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, e.into())
        })?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: parse_enum::<Role>(4, &role)?,
        plan: parse_enum::<Plan>(5, &plan)?,
        usage_count: UsageCounters::new(),
        profile_image: row.get(6)?,
        email_verified: row.get(7)?,
        is_active: row.get(8)?,
        last_login: last_login.as_deref().map(|s| parse_ts(9, s)).transpose()?,
        created_at: parse_ts(10, &created_at)?,
        updated_at: parse_ts(11, &updated_at)?,
    })
}

fn load_counters(conn: &Connection, account_id: &str) -> rusqlite::Result<UsageCounters> {
    let mut stmt =
        conn.prepare("SELECT category, count FROM account_usage WHERE account_id = ?1")?;
    let rows = stmt.query_map(params![account_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    rows.collect()
}

fn fetch_account(conn: &Connection, clause: &str, value: &str) -> Result<Option<Account>> {
    let sql = format!("SELECT {} FROM accounts WHERE {} = ?1", ACCOUNT_COLUMNS, clause);
    let account = conn
        .query_row(&sql, params![value], row_to_account)
        .optional()?;

    match account {
        Some(mut account) => {
            account.usage_count = load_counters(conn, account.id.as_str())?;
            Ok(Some(account))
        }
        None => Ok(None),
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl Store {
    /// Insert a new account. The email column is unique, so a concurrent or
    /// repeated registration for the same address fails with `Conflict`.
    pub fn create_account(&self, new: NewAccount) -> Result<Account> {
        let now = Utc::now();
        let account = Account {
            id: AccountId::new(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            role: Role::User,
            plan: Plan::Free,
            usage_count: UsageCounters::new(),
            profile_image: None,
            email_verified: false,
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        };

        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT INTO accounts
             (id, name, email, password_hash, role, plan, profile_image,
              email_verified, is_active, last_login, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, 0, 1, NULL, ?7, ?7)",
            params![
                account.id.as_str(),
                account.name,
                account.email,
                account.password_hash,
                account.role.as_str(),
                account.plan.as_str(),
                format_ts(now),
            ],
        );

        match inserted {
            Ok(_) => Ok(account),
            Err(e) if is_unique_violation(&e) => Err(Error::conflict("Email already registered")),
            Err(e) => Err(e.into()),
        }
    }

    pub fn find_account(&self, id: &AccountId) -> Result<Option<Account>> {
        let conn = self.conn()?;
        fetch_account(&conn, "id", id.as_str())
    }

    pub fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let conn = self.conn()?;
        fetch_account(&conn, "email", email)
    }

    pub fn record_login(&self, id: &AccountId, at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE accounts SET last_login = ?2 WHERE id = ?1",
            params![id.as_str(), format_ts(at)],
        )?;
        Ok(())
    }

    /// Apply a profile edit. Returns `None` when the account does not exist.
    pub fn update_profile(&self, id: &AccountId, update: &ProfileUpdate) -> Result<Option<Account>> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE accounts
             SET name = COALESCE(?2, name),
                 profile_image = COALESCE(?3, profile_image),
                 updated_at = ?4
             WHERE id = ?1",
            params![
                id.as_str(),
                update.name,
                update.profile_image,
                format_ts(Utc::now())
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        fetch_account(&conn, "id", id.as_str())
    }

    /// Apply an administrative edit (role, plan, activation).
    pub fn update_account(&self, id: &AccountId, update: &AccountUpdate) -> Result<Option<Account>> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE accounts
             SET role = COALESCE(?2, role),
                 plan = COALESCE(?3, plan),
                 is_active = COALESCE(?4, is_active),
                 updated_at = ?5
             WHERE id = ?1",
            params![
                id.as_str(),
                update.role.map(Role::as_str),
                update.plan.map(Plan::as_str),
                update.is_active,
                format_ts(Utc::now())
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        fetch_account(&conn, "id", id.as_str())
    }

    /// All accounts, newest first.
    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM accounts ORDER BY created_at DESC",
            ACCOUNT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut accounts = stmt
            .query_map([], row_to_account)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for account in &mut accounts {
            account.usage_count = load_counters(&conn, account.id.as_str())?;
        }
        Ok(accounts)
    }

    /// Add one to a usage counter, creating it on first use.
    pub fn increment_usage(&self, id: &AccountId, category: &str) -> Result<()> {
        let conn = self.conn()?;
        increment_usage_on(&conn, id.as_str(), category)?;
        Ok(())
    }

    pub fn usage_counters(&self, id: &AccountId) -> Result<UsageCounters> {
        let conn = self.conn()?;
        Ok(load_counters(&conn, id.as_str())?)
    }

    /// Overwrite every counter for an account with the given values.
    pub fn replace_usage_counters(&self, id: &AccountId, counters: &UsageCounters) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM account_usage WHERE account_id = ?1",
            params![id.as_str()],
        )?;
        for (category, count) in counters {
            tx.execute(
                "INSERT INTO account_usage (account_id, category, count) VALUES (?1, ?2, ?3)",
                params![id.as_str(), category, count],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

pub(super) fn increment_usage_on(
    conn: &Connection,
    account_id: &str,
    category: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO account_usage (account_id, category, count) VALUES (?1, ?2, 1)
         ON CONFLICT(account_id, category) DO UPDATE SET count = count + 1",
        params![account_id, category],
    )?;
    Ok(())
}
