//! Collaborator interfaces injected into the stage executor.
//!
//! These are the only I/O paths stage validators may take; everything
//! else is synchronous and CPU-bound, which is what makes the engine
//! testable without a live backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::definition::{DeviceClass, UserField};
use crate::session::Subject;

use super::errors::StageError;

/// Kind of credential material handed to the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    Password,
}

/// Outcome of a credential verification.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyResult {
    Success,
    Failure(String),
    RateLimited,
}

/// A registered second-factor device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub device_id: String,
    pub class: DeviceClass,
    pub name: String,
}

/// Resolves a client-supplied identifier to a subject.
#[async_trait]
pub trait SubjectDirectory: Send + Sync + 'static {
    async fn resolve(
        &self,
        identifier: &str,
        fields: &[UserField],
        case_insensitive: bool,
    ) -> Result<Option<Subject>, StageError>;
}

/// Verifies credential material for an already-identified subject.
/// Implementations enforce their own rate limits and timeouts.
#[async_trait]
pub trait CredentialVerifier: Send + Sync + 'static {
    async fn verify(
        &self,
        kind: CredentialKind,
        material: &str,
        subject: &Subject,
    ) -> Result<VerifyResult, StageError>;
}

/// Lists and drives challenges for a subject's second-factor devices.
#[async_trait]
pub trait DeviceRegistry: Send + Sync + 'static {
    async fn list_devices(&self, subject: &Subject) -> Result<Vec<DeviceDescriptor>, StageError>;

    /// Opaque challenge material for a device, if its class needs any
    /// (e.g. a WebAuthn assertion request). `None` for code-based devices.
    async fn begin_challenge(
        &self,
        device: &DeviceDescriptor,
    ) -> Result<Option<Value>, StageError>;

    async fn complete_challenge(
        &self,
        device: &DeviceDescriptor,
        response: &Value,
    ) -> Result<bool, StageError>;
}
