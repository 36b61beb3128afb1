use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::challenge::FieldError;
use crate::session::FlowContext;

/// Why a flow was terminated by a stage or the engine. Recorded on the
/// cancelled session for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminateReason {
    StageTimeout,
    TooManyAttempts,
    RateLimited,
    MissingUser,
    MfaNotConfigured,
    InvalidInvitation,
}

impl std::fmt::Display for TerminateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::StageTimeout => "stage_timeout",
            Self::TooManyAttempts => "too_many_attempts",
            Self::RateLimited => "rate_limited",
            Self::MissingUser => "missing_user",
            Self::MfaNotConfigured => "mfa_not_configured",
            Self::InvalidInvitation => "invalid_invitation",
        };
        f.write_str(s)
    }
}

/// Outcome of validating a stage response. A tagged union, not an error:
/// validation failures are expected and frequent, and must not unwind
/// control flow.
#[derive(Debug, Clone, PartialEq)]
pub enum StageResult {
    /// Stage passed; merge the updates and advance the plan pointer.
    Advance(FlowContext),
    /// Stage failed validation; re-issue the challenge with errors for
    /// display. `updates` still merge (e.g. attempt counters).
    Retry {
        errors: Vec<FieldError>,
        overrides: Option<serde_json::Map<String, Value>>,
        updates: FlowContext,
    },
    /// Flow is done; the caller must follow the redirect.
    Redirect(String),
    /// Flow cannot continue; the session is cancelled with this reason.
    Terminate(TerminateReason),
}

impl StageResult {
    pub fn retry(errors: Vec<FieldError>) -> Self {
        Self::Retry {
            errors,
            overrides: None,
            updates: FlowContext::new(),
        }
    }
}
