use std::sync::Arc;

use crate::challenge::FieldError;
use crate::definition::IdentificationConfig;
use crate::session::{FlowContext, keys};

use super::errors::StageError;
use super::types::StageResult;
use super::verifier::{CredentialKind, CredentialVerifier, SubjectDirectory, VerifyResult};

// One generic message for both unknown users and bad credentials, so the
// response does not reveal whether the identifier exists.
const GENERIC_ERROR: &str = "Failed to authenticate.";

pub(super) async fn validate(
    directory: &Arc<dyn SubjectDirectory>,
    credentials: &Arc<dyn CredentialVerifier>,
    config: &IdentificationConfig,
    uid_field: &str,
    password: Option<&str>,
) -> Result<StageResult, StageError> {
    let subject = directory
        .resolve(uid_field, &config.user_fields, config.case_insensitive_matching)
        .await?;

    let Some(subject) = subject else {
        tracing::debug!("Identification failed: no subject for identifier");
        return Ok(StageResult::retry(vec![FieldError::new(
            "uid_field",
            "invalid",
            GENERIC_ERROR,
        )]));
    };

    let mut updates = FlowContext::new();

    if config.password_stage {
        let Some(password) = password else {
            return Ok(StageResult::retry(vec![FieldError::new(
                "password",
                "required",
                "Password is required.",
            )]));
        };
        match credentials
            .verify(CredentialKind::Password, password, &subject)
            .await?
        {
            VerifyResult::Success => {
                updates.insert(keys::AUTH_METHOD, serde_json::json!("password"));
            }
            VerifyResult::Failure(reason) => {
                tracing::debug!("Combined password check failed: {}", reason);
                return Ok(StageResult::retry(vec![FieldError::new(
                    "uid_field",
                    "invalid",
                    GENERIC_ERROR,
                )]));
            }
            VerifyResult::RateLimited => {
                return Ok(StageResult::Terminate(
                    super::types::TerminateReason::RateLimited,
                ));
            }
        }
    }

    updates.set_pending_user(&subject);
    updates.insert(keys::PENDING_USER_IDENTIFIER, serde_json::json!(uid_field));
    Ok(StageResult::Advance(updates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::UserField;
    use crate::stage::test_support::{MockDirectory, MockVerifier};

    fn config(password_stage: bool) -> IdentificationConfig {
        IdentificationConfig {
            user_fields: vec![UserField::Username],
            password_stage,
            case_insensitive_matching: false,
        }
    }

    #[tokio::test]
    async fn test_known_user_advances() {
        let directory: Arc<dyn SubjectDirectory> = Arc::new(MockDirectory::with_user("alice"));
        let credentials: Arc<dyn CredentialVerifier> = Arc::new(MockVerifier::accepting("x"));

        let result = validate(&directory, &credentials, &config(false), "alice", None)
            .await
            .unwrap();

        match result {
            StageResult::Advance(updates) => {
                assert_eq!(updates.pending_user().unwrap().username, "alice");
                assert_eq!(
                    updates.get(keys::PENDING_USER_IDENTIFIER),
                    Some(&serde_json::json!("alice"))
                );
            }
            other => panic!("Expected Advance, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_user_gets_generic_retry() {
        let directory: Arc<dyn SubjectDirectory> = Arc::new(MockDirectory::with_user("alice"));
        let credentials: Arc<dyn CredentialVerifier> = Arc::new(MockVerifier::accepting("x"));

        let result = validate(&directory, &credentials, &config(false), "mallory", None)
            .await
            .unwrap();

        match result {
            StageResult::Retry { errors, .. } => {
                assert_eq!(errors.len(), 1);
                // The error must not disclose whether the user exists
                assert_eq!(errors[0].message, GENERIC_ERROR);
            }
            other => panic!("Expected Retry, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_combined_password_wrong_is_same_generic_error() {
        let directory: Arc<dyn SubjectDirectory> = Arc::new(MockDirectory::with_user("alice"));
        let credentials: Arc<dyn CredentialVerifier> = Arc::new(MockVerifier::accepting("right"));

        let result = validate(
            &directory,
            &credentials,
            &config(true),
            "alice",
            Some("wrong"),
        )
        .await
        .unwrap();

        match result {
            StageResult::Retry { errors, .. } => {
                assert_eq!(errors[0].message, GENERIC_ERROR);
            }
            other => panic!("Expected Retry, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_combined_password_success_sets_auth_method() {
        let directory: Arc<dyn SubjectDirectory> = Arc::new(MockDirectory::with_user("alice"));
        let credentials: Arc<dyn CredentialVerifier> = Arc::new(MockVerifier::accepting("right"));

        let result = validate(
            &directory,
            &credentials,
            &config(true),
            "alice",
            Some("right"),
        )
        .await
        .unwrap();

        match result {
            StageResult::Advance(updates) => {
                assert_eq!(
                    updates.get(keys::AUTH_METHOD),
                    Some(&serde_json::json!("password"))
                );
            }
            other => panic!("Expected Advance, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_combined_password_missing_is_required_error() {
        let directory: Arc<dyn SubjectDirectory> = Arc::new(MockDirectory::with_user("alice"));
        let credentials: Arc<dyn CredentialVerifier> = Arc::new(MockVerifier::accepting("right"));

        let result = validate(&directory, &credentials, &config(true), "alice", None)
            .await
            .unwrap();

        match result {
            StageResult::Retry { errors, .. } => {
                assert_eq!(errors[0].field, "password");
                assert_eq!(errors[0].code, "required");
            }
            other => panic!("Expected Retry, got {other:?}"),
        }
    }
}
