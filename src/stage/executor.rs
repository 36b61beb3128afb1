use std::sync::Arc;

use crate::challenge::StageResponse;
use crate::definition::{StageBinding, StageConfig};
use crate::session::FlowSession;

use super::errors::StageError;
use super::types::StageResult;
use super::verifier::{CredentialVerifier, DeviceRegistry, SubjectDirectory};
use super::{identification, invitation, mfa_validate, password, redirect};

/// Validates decoded stage responses against the session's current
/// binding. Pure dispatch: all policy about what happens to the session
/// afterwards (persisting, replanning, terminating) lives in the engine.
pub struct StageExecutor {
    subjects: Arc<dyn SubjectDirectory>,
    credentials: Arc<dyn CredentialVerifier>,
    devices: Arc<dyn DeviceRegistry>,
}

impl StageExecutor {
    pub fn new(
        subjects: Arc<dyn SubjectDirectory>,
        credentials: Arc<dyn CredentialVerifier>,
        devices: Arc<dyn DeviceRegistry>,
    ) -> Self {
        Self {
            subjects,
            credentials,
            devices,
        }
    }

    /// Run the stage validator for `binding` against an already-decoded
    /// response. The codec guarantees the response component matches the
    /// binding's kind; a mismatch here is a programming error upstream.
    pub async fn execute(
        &self,
        session: &FlowSession,
        binding: &StageBinding,
        response: &StageResponse,
    ) -> Result<StageResult, StageError> {
        match (&binding.stage, response) {
            (
                StageConfig::Identification(config),
                StageResponse::Identification {
                    uid_field,
                    password,
                },
            ) => {
                identification::validate(
                    &self.subjects,
                    &self.credentials,
                    config,
                    uid_field,
                    password.as_deref(),
                )
                .await
            }
            (StageConfig::Password(config), StageResponse::Password { password }) => {
                password::validate(&self.credentials, session, config, password).await
            }
            (
                StageConfig::MfaValidate(config),
                StageResponse::MfaValidate {
                    device_id,
                    response,
                },
            ) => mfa_validate::validate(&self.devices, session, config, device_id, response).await,
            (StageConfig::Redirect(config), StageResponse::Redirect {}) => {
                redirect::validate(config)
            }
            (StageConfig::Invitation(config), StageResponse::Invitation { token }) => {
                invitation::validate(config, token.as_deref())
            }
            _ => Err(StageError::ResponseMismatch),
        }
    }
}
