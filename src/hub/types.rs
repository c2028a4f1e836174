//! Invocation lifecycle types.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::tools::ToolKind;
use crate::types::{AccountId, Error, RequestId, Result};

/// Phase of one tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationPhase {
    Received,
    Validated,
    Authenticated,
    Dispatched,
    Succeeded,
    Failed,
    Recorded,
    Responded,
}

impl InvocationPhase {
    pub fn can_transition_to(self, to: InvocationPhase) -> bool {
        use InvocationPhase::*;
        match (self, to) {
            // RECEIVED
            (Received, Validated) => true,
            (Received, Responded) => true, // Bad input
            // VALIDATED
            (Validated, Authenticated) => true,
            (Validated, Responded) => true, // Plan ceiling reached
            // AUTHENTICATED
            (Authenticated, Dispatched) => true,
            (Authenticated, Responded) => true,
            // DISPATCHED
            (Dispatched, Succeeded) => true,
            (Dispatched, Failed) => true,
            // SUCCEEDED / FAILED
            (Succeeded, Recorded) => true,
            (Failed, Recorded) => true,
            // RECORDED
            (Recorded, Responded) => true,
            // RESPONDED is terminal
            (Responded, _) => false,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == InvocationPhase::Responded
    }
}

/// Tracks one invocation through its phases.
#[derive(Debug)]
pub struct Invocation {
    pub id: RequestId,
    pub account_id: AccountId,
    pub kind: ToolKind,
    phase: InvocationPhase,
    dispatched_at: Option<Instant>,
}

impl Invocation {
    pub fn new(account_id: AccountId, kind: ToolKind) -> Self {
        Self {
            id: RequestId::new(),
            account_id,
            kind,
            phase: InvocationPhase::Received,
            dispatched_at: None,
        }
    }

    pub fn phase(&self) -> InvocationPhase {
        self.phase
    }

    /// Move to `to`, refusing transitions the lifecycle does not allow.
    pub fn advance(&mut self, to: InvocationPhase) -> Result<()> {
        if !self.phase.can_transition_to(to) {
            return Err(Error::internal(format!(
                "invalid invocation transition {:?} -> {:?}",
                self.phase, to
            )));
        }
        if to == InvocationPhase::Dispatched {
            self.dispatched_at = Some(Instant::now());
        }
        tracing::trace!(request_id = %self.id, from = ?self.phase, to = ?to, "invocation phase");
        self.phase = to;
        Ok(())
    }

    /// Seconds since dispatch; zero if never dispatched.
    pub fn elapsed_secs(&self) -> f64 {
        self.dispatched_at
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}
