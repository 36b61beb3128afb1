use std::sync::Arc;

use serde_json::Value;

use crate::challenge::{DeviceChallenge, FieldError};
use crate::definition::{MfaValidateConfig, NotConfiguredAction};
use crate::session::{FlowContext, FlowSession, keys};

use super::errors::StageError;
use super::types::{StageResult, TerminateReason};
use super::verifier::DeviceRegistry;

pub(super) async fn validate(
    devices: &Arc<dyn DeviceRegistry>,
    session: &FlowSession,
    config: &MfaValidateConfig,
    device_id: &str,
    response: &Value,
) -> Result<StageResult, StageError> {
    // Device descriptors were fetched into the context when the challenge
    // was issued; validation only accepts what was offered.
    let offered: Vec<DeviceChallenge> = session
        .context
        .get(keys::MFA_DEVICES)
        .and_then(|v| serde_json::from_value::<Vec<DeviceChallenge>>(v.clone()).ok())
        .unwrap_or_default()
        .into_iter()
        .filter(|d| config.device_classes.contains(&d.device.class))
        .collect();

    if offered.is_empty() {
        return match config.not_configured_action {
            NotConfiguredAction::Skip => {
                tracing::debug!("No eligible MFA devices, skipping stage");
                Ok(StageResult::Advance(FlowContext::new()))
            }
            NotConfiguredAction::Deny => {
                Ok(StageResult::Terminate(TerminateReason::MfaNotConfigured))
            }
        };
    }

    let Some(selected) = offered.iter().find(|d| d.device.device_id == device_id) else {
        return Ok(StageResult::retry(vec![FieldError::new(
            "device_id",
            "invalid",
            "Unknown or not permitted device.",
        )]));
    };

    if devices.complete_challenge(&selected.device, response).await? {
        let mut updates = FlowContext::new();
        updates.insert(
            keys::MFA_DEVICE,
            serde_json::to_value(&selected.device).unwrap_or(Value::Null),
        );
        updates.insert(keys::AUTH_METHOD, serde_json::json!("mfa"));
        Ok(StageResult::Advance(updates))
    } else {
        Ok(StageResult::retry(vec![FieldError::new(
            "response",
            "invalid",
            "Invalid authentication response.",
        )]))
    }
}
