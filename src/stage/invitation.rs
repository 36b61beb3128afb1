use subtle::{Choice, ConstantTimeEq};

use crate::challenge::FieldError;
use crate::definition::InvitationConfig;
use crate::session::{FlowContext, keys};

use super::errors::StageError;
use super::types::{StageResult, TerminateReason};

/// Whether `token` matches any configured token. Every candidate is
/// compared, even after a match, so timing does not leak which (if any)
/// token matched.
fn token_matches(config: &InvitationConfig, token: &str) -> bool {
    let mut matched = Choice::from(0u8);
    for candidate in &config.tokens {
        matched |= candidate.as_bytes().ct_eq(token.as_bytes());
    }
    matched.into()
}

pub(super) fn validate(
    config: &InvitationConfig,
    token: Option<&str>,
) -> Result<StageResult, StageError> {
    let Some(token) = token else {
        if config.continue_flow_without_invitation {
            return Ok(StageResult::Advance(FlowContext::new()));
        }
        return Ok(StageResult::retry(vec![FieldError::new(
            "token",
            "required",
            "An invitation is required.",
        )]));
    };

    if token_matches(config, token) {
        let mut updates = FlowContext::new();
        updates.insert(keys::INVITATION, serde_json::json!({ "token": token }));
        Ok(StageResult::Advance(updates))
    } else {
        Ok(StageResult::Terminate(TerminateReason::InvalidInvitation))
    }
}
