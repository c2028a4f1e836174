//! Plan allowance: which plans may still use which tools.
//!
//! Ceilings come from each tool's [`UsageLimits`]. Enforcement is off unless
//! the policy is built with `enforce = true`; when off every check passes.

use crate::store::{Plan, UsageCounters};
use crate::tools::catalog::{ToolDefinition, UsageLimits};
use crate::types::{Error, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct ToolAccessPolicy {
    enforce: bool,
}

impl ToolAccessPolicy {
    pub fn new(enforce: bool) -> Self {
        Self { enforce }
    }

    pub fn is_enforced(&self) -> bool {
        self.enforce
    }

    /// Invocations left for `plan` given `used`; `None` when unlimited.
    pub fn remaining(limits: &UsageLimits, plan: Plan, used: i64) -> Option<u64> {
        limits
            .limit_for(plan)
            .map(|limit| limit.saturating_sub(u64::try_from(used).unwrap_or_default()))
    }

    /// Reject with `QuotaExceeded` when the account has used up its plan's
    /// ceiling for this tool.
    pub fn check_access(
        &self,
        plan: Plan,
        tool: &ToolDefinition,
        counters: &UsageCounters,
    ) -> Result<()> {
        if !tool.is_active {
            return Err(Error::forbidden(format!("{} is not available", tool.name)));
        }
        if !self.enforce {
            return Ok(());
        }

        let used = counters.get(tool.kind.as_str()).copied().unwrap_or(0);
        match Self::remaining(&tool.usage_limits, plan, used) {
            Some(0) => Err(Error::quota_exceeded(format!(
                "Usage limit reached for {} on the {} plan",
                tool.name,
                plan.as_str()
            ))),
            _ => Ok(()),
        }
    }
}
