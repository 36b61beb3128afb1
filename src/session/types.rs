use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{FLOW_SESSION_TTL, FLOW_STAGE_TIMEOUT};
use crate::definition::{FlowId, StageBinding};

use super::context::FlowContext;

/// Lifecycle of a flow session. `InProgress` is re-entered on every client
/// round-trip; the other states are terminal except `Planning`, which only
/// exists while the initial plan is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Planning,
    InProgress,
    Completed,
    Cancelled,
    Expired,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Expired)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Planning => "planning",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// Per-attempt mutable state, keyed by an opaque session token.
///
/// The session owns its own copy of the resolved plan so later edits to
/// the flow definition cannot corrupt an in-flight attempt. While
/// `status == InProgress`, `plan_index` is a valid index into
/// `resolved_plan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSession {
    pub token: String,
    pub flow_id: FlowId,
    pub status: SessionStatus,
    pub resolved_plan: Vec<StageBinding>,
    pub plan_index: usize,
    pub context: FlowContext,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// When the current stage's challenge was first issued. Not reset by
    /// `Retry`; the per-stage timer runs from the first issuance.
    pub challenge_issued_at: Option<DateTime<Utc>>,
    /// Why a cancelled session ended, recorded for audit.
    #[serde(default)]
    pub termination_reason: Option<String>,
}

impl FlowSession {
    pub fn new(
        token: String,
        flow_id: FlowId,
        resolved_plan: Vec<StageBinding>,
        context: FlowContext,
    ) -> Self {
        let now = Utc::now();
        Self {
            token,
            flow_id,
            status: SessionStatus::Planning,
            resolved_plan,
            plan_index: 0,
            context,
            created_at: now,
            expires_at: now + Duration::seconds(*FLOW_SESSION_TTL as i64),
            challenge_issued_at: None,
            termination_reason: None,
        }
    }

    pub fn current_binding(&self) -> Option<&StageBinding> {
        self.resolved_plan.get(self.plan_index)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Whether the current stage's challenge has outlived its timeout,
    /// independent of the overall session expiry.
    pub fn stage_timed_out(&self, now: DateTime<Utc>) -> bool {
        let Some(issued_at) = self.challenge_issued_at else {
            return false;
        };
        let timeout = self
            .current_binding()
            .and_then(|b| b.stage_timeout)
            .unwrap_or(*FLOW_STAGE_TIMEOUT);
        now > issued_at + Duration::seconds(timeout)
    }

    /// Mark the current stage's challenge as issued, keeping the original
    /// timestamp when the challenge is re-issued on retry.
    pub fn mark_challenge_issued(&mut self, now: DateTime<Utc>) {
        if self.challenge_issued_at.is_none() {
            self.challenge_issued_at = Some(now);
        }
    }
}
