//! Quota Ledger: usage counters plus the append-only usage log.
//!
//! Writes made on behalf of a tool invocation never fail the request: a store
//! error is logged and swallowed. Read-side queries propagate errors.

use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::store::{
    DailyActivity, HistoryPage, HistoryQuery, Plan, Store, ToolAnalytics, ToolUsageCount,
    UsageCounters, UsageEvent, UsageStatus,
};
use crate::tools::ToolDefinition;
use crate::types::{AccountId, Error, Result, UsageEventId};

const RECENT_ACTIVITY_DAYS: i64 = 7;

/// Outcome of one dispatched invocation, ready to be logged.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub input: Value,
    pub output: Option<Value>,
    pub tokens_used: i64,
    /// Seconds.
    pub execution_time: f64,
    pub status: UsageStatus,
    pub error: Option<String>,
}

impl Attempt {
    pub fn succeeded(input: Value, output: Value, tokens_used: i64, execution_time: f64) -> Self {
        Self {
            input,
            output: Some(output),
            tokens_used,
            execution_time,
            status: UsageStatus::Success,
            error: None,
        }
    }

    pub fn failed(input: Value, error: impl Into<String>, execution_time: f64) -> Self {
        Self {
            input,
            output: None,
            tokens_used: 0,
            execution_time,
            status: UsageStatus::Failed,
            error: Some(error.into()),
        }
    }

    fn into_event(self, account: &AccountId, tool: &ToolDefinition) -> UsageEvent {
        UsageEvent {
            id: UsageEventId::new(),
            user_id: account.clone(),
            tool_slug: tool.slug.clone(),
            tool_name: tool.name.clone(),
            category: tool.kind.as_str().to_string(),
            input: self.input,
            output: self.output,
            tokens_used: self.tokens_used,
            execution_time: self.execution_time,
            status: self.status,
            error: self.error,
            created_at: Utc::now(),
        }
    }
}

/// Usage summary for the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub total_usage: u64,
    pub usage_count: UsageCounters,
    pub plan_type: Plan,
    pub usage_by_tool: Vec<ToolUsageCount>,
    pub recent_activity: Vec<DailyActivity>,
}

/// Counter values before and after a reconcile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub before: UsageCounters,
    pub after: UsageCounters,
}

impl ReconcileReport {
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

#[derive(Debug, Clone)]
pub struct QuotaLedger {
    store: Store,
    atomic: bool,
}

impl QuotaLedger {
    /// `atomic` makes success logging and the counter bump one transaction.
    pub fn new(store: Store, atomic: bool) -> Self {
        Self { store, atomic }
    }

    // =========================================================================
    // Write side
    // =========================================================================

    /// Append a usage event. Returns the event id, or `None` if the write
    /// failed (already logged).
    pub fn record_attempt(
        &self,
        account: &AccountId,
        tool: &ToolDefinition,
        attempt: Attempt,
    ) -> Option<UsageEventId> {
        let event = attempt.into_event(account, tool);
        match self.store.append_event(&event) {
            Ok(()) => Some(event.id),
            Err(e) => {
                tracing::error!(
                    account_id = %account,
                    tool = %tool.slug,
                    status = event.status.as_str(),
                    error = %e,
                    "Failed to record usage event"
                );
                None
            }
        }
    }

    /// Add one to the account's counter for `category`. Failures are logged.
    pub fn increment_usage(&self, account: &AccountId, category: &str) {
        if let Err(e) = self.store.increment_usage(account, category) {
            tracing::error!(
                account_id = %account,
                category,
                error = %e,
                "Failed to update usage counter"
            );
        }
    }

    /// Log a successful attempt and bump its counter.
    pub fn record_success(
        &self,
        account: &AccountId,
        tool: &ToolDefinition,
        attempt: Attempt,
    ) -> Option<UsageEventId> {
        debug_assert_eq!(attempt.status, UsageStatus::Success);

        if !self.atomic {
            let id = self.record_attempt(account, tool, attempt);
            self.increment_usage(account, tool.kind.as_str());
            return id;
        }

        let event = attempt.into_event(account, tool);
        match self.store.append_success_with_increment(&event) {
            Ok(()) => Some(event.id),
            Err(e) => {
                tracing::error!(
                    account_id = %account,
                    tool = %tool.slug,
                    error = %e,
                    "Failed to record successful usage"
                );
                None
            }
        }
    }

    // =========================================================================
    // Read side
    // =========================================================================

    pub fn counters(&self, account: &AccountId) -> Result<UsageCounters> {
        self.store.usage_counters(account)
    }

    pub fn history(&self, account: &AccountId, query: &HistoryQuery) -> Result<HistoryPage> {
        self.store.list_events(account, query)
    }

    pub fn delete_entry(&self, account: &AccountId, id: &UsageEventId) -> Result<()> {
        if self.store.delete_event(account, id)? {
            tracing::info!(account_id = %account, event_id = %id, "Deleted usage event");
            Ok(())
        } else {
            Err(Error::not_found("History item not found"))
        }
    }

    pub fn stats(&self, account: &AccountId) -> Result<UsageStats> {
        let record = self
            .store
            .find_account(account)?
            .ok_or_else(|| Error::not_found("User not found"))?;
        let since = Utc::now() - Duration::days(RECENT_ACTIVITY_DAYS);

        Ok(UsageStats {
            total_usage: self.store.count_events(account)?,
            usage_count: record.usage_count,
            plan_type: record.plan,
            usage_by_tool: self.store.usage_by_tool(account)?,
            recent_activity: self.store.recent_activity(account, since)?,
        })
    }

    /// Recompute the account's counters from its successful events.
    pub fn reconcile(&self, account: &AccountId) -> Result<ReconcileReport> {
        if self.store.find_account(account)?.is_none() {
            return Err(Error::not_found("User not found"));
        }
        let before = self.store.usage_counters(account)?;
        let after = self.store.success_counts_by_category(account)?;
        self.store.replace_usage_counters(account, &after)?;

        let report = ReconcileReport { before, after };
        if report.changed() {
            tracing::warn!(
                account_id = %account,
                before = ?report.before,
                after = ?report.after,
                "Usage counters drifted; reconciled"
            );
        }
        Ok(report)
    }

    pub fn analytics(&self) -> Result<Vec<ToolAnalytics>> {
        self.store.tool_analytics()
    }
}
