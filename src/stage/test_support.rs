//! Mock collaborators shared by stage validator tests.

use async_trait::async_trait;
use serde_json::Value;

use crate::definition::{DeviceClass, UserField};
use crate::session::{FlowContext, FlowSession, Subject};

use super::errors::StageError;
use super::verifier::{
    CredentialKind, CredentialVerifier, DeviceDescriptor, DeviceRegistry, SubjectDirectory,
    VerifyResult,
};

pub(crate) struct MockDirectory {
    subjects: Vec<Subject>,
}

impl MockDirectory {
    pub(crate) fn with_user(username: &str) -> Self {
        Self {
            subjects: vec![Subject {
                id: format!("id-{username}"),
                username: username.to_string(),
                email: Some(format!("{username}@example.com")),
                attributes: serde_json::Map::new(),
            }],
        }
    }
}

#[async_trait]
impl SubjectDirectory for MockDirectory {
    async fn resolve(
        &self,
        identifier: &str,
        fields: &[UserField],
        case_insensitive: bool,
    ) -> Result<Option<Subject>, StageError> {
        let matches = |candidate: &str| {
            if case_insensitive {
                candidate.eq_ignore_ascii_case(identifier)
            } else {
                candidate == identifier
            }
        };
        Ok(self
            .subjects
            .iter()
            .find(|s| {
                fields.iter().any(|f| match f {
                    UserField::Username => matches(&s.username),
                    UserField::Email => s.email.as_deref().is_some_and(matches),
                })
            })
            .cloned())
    }
}

pub(crate) struct MockVerifier {
    accepted: Option<String>,
}

impl MockVerifier {
    pub(crate) fn accepting(password: &str) -> Self {
        Self {
            accepted: Some(password.to_string()),
        }
    }

    pub(crate) fn rate_limited() -> Self {
        Self { accepted: None }
    }
}

#[async_trait]
impl CredentialVerifier for MockVerifier {
    async fn verify(
        &self,
        _kind: CredentialKind,
        material: &str,
        _subject: &Subject,
    ) -> Result<VerifyResult, StageError> {
        match &self.accepted {
            None => Ok(VerifyResult::RateLimited),
            Some(accepted) if accepted == material => Ok(VerifyResult::Success),
            Some(_) => Ok(VerifyResult::Failure("password mismatch".to_string())),
        }
    }
}

pub(crate) struct MockRegistry {
    devices: Vec<DeviceDescriptor>,
    accepted_code: String,
}

impl MockRegistry {
    pub(crate) fn accepting(code: &str) -> Self {
        Self {
            devices: vec![DeviceDescriptor {
                device_id: "d1".to_string(),
                class: DeviceClass::Totp,
                name: "Authenticator".to_string(),
            }],
            accepted_code: code.to_string(),
        }
    }
}

#[async_trait]
impl DeviceRegistry for MockRegistry {
    async fn list_devices(&self, _subject: &Subject) -> Result<Vec<DeviceDescriptor>, StageError> {
        Ok(self.devices.clone())
    }

    async fn begin_challenge(
        &self,
        _device: &DeviceDescriptor,
    ) -> Result<Option<Value>, StageError> {
        Ok(None)
    }

    async fn complete_challenge(
        &self,
        _device: &DeviceDescriptor,
        response: &Value,
    ) -> Result<bool, StageError> {
        Ok(response.as_str() == Some(self.accepted_code.as_str()))
    }
}

pub(crate) fn empty_session() -> FlowSession {
    FlowSession::new(
        "test-token".to_string(),
        "test-flow".to_string(),
        Vec::new(),
        FlowContext::new(),
    )
}

pub(crate) fn session_with_pending_user(subject: &Subject) -> FlowSession {
    let mut session = empty_session();
    session.context.set_pending_user(subject);
    session
}
