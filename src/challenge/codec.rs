use serde_json::Value;

use crate::definition::{FlowDefinition, StageBinding, StageConfig};
use crate::session::{FlowSession, keys};

use super::errors::DecodeError;
use super::types::{Challenge, ChallengePayload, DeviceChallenge, FlowInfo, StageResponse};

/// Build the challenge for the binding at the session's current plan
/// index. Pure and deterministic: everything the payload needs, including
/// MFA device material, is read from the session context.
pub fn encode(
    session: &FlowSession,
    binding: &StageBinding,
    definition: &FlowDefinition,
) -> Challenge {
    let payload = match &binding.stage {
        StageConfig::Identification(cfg) => ChallengePayload::Identification {
            user_fields: cfg.user_fields.clone(),
            password_fields: cfg.password_stage,
        },
        StageConfig::Password(_) => ChallengePayload::Password {
            pending_user_identifier: session
                .context
                .get(keys::PENDING_USER_IDENTIFIER)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
        },
        StageConfig::MfaValidate(cfg) => {
            let devices: Vec<DeviceChallenge> = session
                .context
                .get(keys::MFA_DEVICES)
                .and_then(|v| serde_json::from_value::<Vec<DeviceChallenge>>(v.clone()).ok())
                .unwrap_or_default()
                .into_iter()
                .filter(|d| cfg.device_classes.contains(&d.device.class))
                .collect();
            ChallengePayload::MfaValidate { devices }
        }
        StageConfig::Redirect(cfg) => ChallengePayload::Redirect {
            to: cfg.target.clone(),
        },
        StageConfig::Invitation(cfg) => ChallengePayload::Invitation {
            required: !cfg.continue_flow_without_invitation,
        },
    };

    Challenge {
        flow: FlowInfo {
            slug: definition.slug.clone(),
            title: definition.title.clone(),
            designation: definition.designation,
        },
        payload,
        response_errors: Vec::new(),
        overrides: None,
    }
}

/// Parse a raw response payload into the typed response for `binding`.
///
/// Shape errors (unknown fields, missing fields, type mismatches) and
/// responses addressed to a different stage are rejected here so stage
/// validators are free of defensive parsing.
pub fn decode(binding: &StageBinding, raw: &Value) -> Result<StageResponse, DecodeError> {
    let response: StageResponse = serde_json::from_value(raw.clone())
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let expected = binding.stage.kind_name();
    if response.kind_name() != expected {
        return Err(DecodeError::WrongStage {
            expected: expected.to_string(),
            got: response.kind_name().to_string(),
        });
    }
    Ok(response)
}
