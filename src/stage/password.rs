use std::sync::Arc;

use crate::challenge::FieldError;
use crate::definition::PasswordConfig;
use crate::session::{FlowContext, FlowSession, keys};

use super::errors::StageError;
use super::types::{StageResult, TerminateReason};
use super::verifier::{CredentialKind, CredentialVerifier, VerifyResult};

pub(super) async fn validate(
    credentials: &Arc<dyn CredentialVerifier>,
    session: &FlowSession,
    config: &PasswordConfig,
    password: &str,
) -> Result<StageResult, StageError> {
    let Some(subject) = session.context.pending_user() else {
        tracing::warn!("Password stage reached without a pending user");
        return Ok(StageResult::Terminate(TerminateReason::MissingUser));
    };

    match credentials
        .verify(CredentialKind::Password, password, &subject)
        .await?
    {
        VerifyResult::Success => {
            let mut updates = FlowContext::new();
            updates.insert(keys::AUTH_METHOD, serde_json::json!("password"));
            Ok(StageResult::Advance(updates))
        }
        VerifyResult::Failure(reason) => {
            let attempts = session.context.password_attempts() + 1;
            tracing::debug!(
                "Password verification failed (attempt {}/{}): {}",
                attempts,
                config.max_attempts,
                reason
            );
            if attempts >= config.max_attempts {
                return Ok(StageResult::Terminate(TerminateReason::TooManyAttempts));
            }
            let mut updates = FlowContext::new();
            updates.insert(keys::PASSWORD_ATTEMPTS, serde_json::json!(attempts));
            Ok(StageResult::Retry {
                errors: vec![FieldError::new("password", "invalid", "Invalid password.")],
                overrides: None,
                updates,
            })
        }
        VerifyResult::RateLimited => Ok(StageResult::Terminate(TerminateReason::RateLimited)),
    }
}
