//! Request Orchestrator: one tool invocation from validated input to ledger
//! entry.
//!
//! Bad input and plan rejections return before anything is dispatched or
//! recorded. Every dispatched call leaves exactly one usage event, success or
//! failure, before the response goes out.

use serde_json::Value;
use std::sync::Arc;

use crate::auth::AuthContext;
use crate::gateway::{ToolGateway, ToolRequest};
use crate::hub::blocking;
use crate::hub::ledger::{Attempt, QuotaLedger};
use crate::hub::types::{Invocation, InvocationPhase};
use crate::store::{Plan, Store, UsageCounters, UsageStatus};
use crate::tools::{ToolAccessPolicy, ToolCatalog, ToolDefinition, ToolKind};
use crate::types::{AccountId, Error, Result};

#[derive(Debug, Clone)]
pub struct RequestOrchestrator {
    gateway: ToolGateway,
    ledger: QuotaLedger,
    catalog: Arc<ToolCatalog>,
    policy: ToolAccessPolicy,
    store: Store,
}

impl RequestOrchestrator {
    pub fn new(
        gateway: ToolGateway,
        ledger: QuotaLedger,
        catalog: Arc<ToolCatalog>,
        policy: ToolAccessPolicy,
        store: Store,
    ) -> Self {
        Self {
            gateway,
            ledger,
            catalog,
            policy,
            store,
        }
    }

    /// Plan and counters for the allowance check; skipped when not enforced.
    async fn allowance_inputs(&self, auth: &AuthContext) -> Result<(Plan, UsageCounters)> {
        if !self.policy.is_enforced() {
            return Ok((Plan::default(), UsageCounters::new()));
        }
        let (store, id) = (self.store.clone(), auth.account_id.clone());
        let account = blocking(move || store.find_account(&id))
            .await?
            .ok_or_else(|| Error::not_found("User not found"))?;
        Ok((account.plan, account.usage_count))
    }

    /// Write the attempt to the ledger. A failed write is logged, never
    /// returned.
    async fn record(&self, account: &AccountId, tool: &ToolDefinition, attempt: Attempt) {
        let ledger = self.ledger.clone();
        let (account, tool) = (account.clone(), tool.clone());
        let written = blocking(move || {
            Ok(match attempt.status {
                UsageStatus::Success => ledger.record_success(&account, &tool, attempt),
                _ => ledger.record_attempt(&account, &tool, attempt),
            })
        })
        .await;
        if let Err(e) = written {
            tracing::error!(error = %e, "Usage recording task failed");
        }
    }

    /// Run one invocation of `kind` for `auth` and return the response `data`.
    pub async fn invoke(&self, auth: &AuthContext, kind: ToolKind, body: &Value) -> Result<Value> {
        let mut inv = Invocation::new(auth.account_id.clone(), kind);

        let precheck = async {
            let request = ToolRequest::parse(kind, body)?;
            let tool = self
                .catalog
                .for_kind(kind)
                .ok_or_else(|| Error::not_found(format!("Tool not found: {}", kind.slug())))?;
            let (plan, counters) = self.allowance_inputs(auth).await?;
            self.policy.check_access(plan, tool, &counters)?;
            Ok::<_, Error>((request, tool))
        }
        .await;
        let (request, tool) = match precheck {
            Ok(ok) => ok,
            Err(e) => {
                inv.advance(InvocationPhase::Responded)?;
                tracing::debug!(request_id = %inv.id, tool = %kind, error = %e, "Invocation rejected");
                return Err(e);
            }
        };
        inv.advance(InvocationPhase::Validated)?;
        inv.advance(InvocationPhase::Authenticated)?;

        let input = request.ledger_input();
        inv.advance(InvocationPhase::Dispatched)?;
        let outcome = self.gateway.invoke(&request).await;
        let execution_time = inv.elapsed_secs();

        match outcome {
            Ok(result) => {
                inv.advance(InvocationPhase::Succeeded)?;
                let tokens = result.tokens_used();
                self.record(
                    &auth.account_id,
                    tool,
                    Attempt::succeeded(input, result.ledger_output(), tokens, execution_time),
                )
                .await;
                inv.advance(InvocationPhase::Recorded)?;
                inv.advance(InvocationPhase::Responded)?;

                tracing::info!(
                    request_id = %inv.id,
                    account_id = %auth.account_id,
                    tool = %kind,
                    tokens,
                    execution_time,
                    "Tool invocation succeeded"
                );
                Ok(result.response_data(execution_time))
            }
            Err(e) => {
                inv.advance(InvocationPhase::Failed)?;
                self.record(
                    &auth.account_id,
                    tool,
                    Attempt::failed(input, e.client_message(), execution_time),
                )
                .await;
                inv.advance(InvocationPhase::Recorded)?;
                inv.advance(InvocationPhase::Responded)?;

                tracing::warn!(
                    request_id = %inv.id,
                    account_id = %auth.account_id,
                    tool = %kind,
                    error = %e,
                    execution_time,
                    "Tool invocation failed"
                );
                Err(e)
            }
        }
    }
}
