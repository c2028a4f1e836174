//! Persisted records: accounts and usage events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::types::{AccountId, Error, UsageEventId};

// =============================================================================
// Enums
// =============================================================================

/// Account role carried in the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(Error::validation(format!("Unknown role: {}", other))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl Plan {
    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Pro => "pro",
            Plan::Enterprise => "enterprise",
        }
    }
}

impl FromStr for Plan {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Plan::Free),
            "pro" => Ok(Plan::Pro),
            "enterprise" => Ok(Plan::Enterprise),
            other => Err(Error::validation(format!("Unknown plan: {}", other))),
        }
    }
}

/// Outcome of one tool invocation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageStatus {
    Success,
    Failed,
    Pending,
}

impl UsageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UsageStatus::Success => "success",
            UsageStatus::Failed => "failed",
            UsageStatus::Pending => "pending",
        }
    }
}

impl FromStr for UsageStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(UsageStatus::Success),
            "failed" => Ok(UsageStatus::Failed),
            "pending" => Ok(UsageStatus::Pending),
            other => Err(Error::validation(format!("Unknown usage status: {}", other))),
        }
    }
}

// =============================================================================
// Accounts
// =============================================================================

/// Usage counters keyed by usage category.
pub type UsageCounters = BTreeMap<String, i64>;

/// Registered account as stored.
///
/// Deliberately not `Serialize`: responses go through [`AccountProfile`], which
/// has no credential field.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub plan: Plan,
    pub usage_count: UsageCounters,
    pub profile_image: Option<String>,
    pub email_verified: bool,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            plan_type: self.plan,
            usage_count: self.usage_count.clone(),
            profile_image: self.profile_image.clone(),
            email_verified: self.email_verified,
            is_active: self.is_active,
            last_login: self.last_login,
            created_at: self.created_at,
        }
    }
}

/// Client-facing projection of an account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountProfile {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub plan_type: Plan,
    pub usage_count: UsageCounters,
    pub profile_image: Option<String>,
    pub email_verified: bool,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to create an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Self-service profile edits.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub profile_image: Option<String>,
}

/// Administrative account edits.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUpdate {
    pub role: Option<Role>,
    #[serde(alias = "plan_type")]
    pub plan: Option<Plan>,
    pub is_active: Option<bool>,
}

// =============================================================================
// Usage events
// =============================================================================

/// Append-only record of one tool invocation attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageEvent {
    pub id: UsageEventId,
    pub user_id: AccountId,
    pub tool_slug: String,
    pub tool_name: String,
    pub category: String,
    pub input: Value,
    pub output: Option<Value>,
    pub tokens_used: i64,
    /// Seconds.
    pub execution_time: f64,
    pub status: UsageStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Filter and paging for history listings.
#[derive(Debug, Clone)]
pub struct HistoryQuery {
    /// 1-based page.
    pub page: u32,
    pub limit: u32,
    /// Exact tool display name.
    pub tool: Option<String>,
}

/// One page of history plus the unpaged total.
#[derive(Debug, Clone)]
pub struct HistoryPage {
    pub items: Vec<UsageEvent>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl HistoryPage {
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit))
    }
}

/// Invocation count for one tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolUsageCount {
    pub tool: String,
    pub count: i64,
}

/// Invocation count for one UTC day (`YYYY-MM-DD`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyActivity {
    pub date: String,
    pub count: i64,
}

/// Per-tool totals across all accounts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolAnalytics {
    pub tool_slug: String,
    pub tool_name: String,
    pub successes: i64,
    pub failures: i64,
    pub tokens_used: i64,
    pub avg_execution_time: f64,
}
