use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::definition::{FlowDesignation, UserField};
use crate::stage::DeviceDescriptor;

/// Structured, per-field error detail attached to a re-issued challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl FieldError {
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Flow metadata shown alongside every challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowInfo {
    pub slug: String,
    pub title: String,
    pub designation: FlowDesignation,
}

/// A device the client may use to satisfy an MFA validation challenge,
/// together with the opaque material started for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceChallenge {
    #[serde(flatten)]
    pub device: DeviceDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<Value>,
}

/// Stage-specific challenge payload, tagged by `component` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "component", rename_all = "snake_case")]
pub enum ChallengePayload {
    Identification {
        user_fields: Vec<UserField>,
        password_fields: bool,
    },
    Password {
        #[serde(skip_serializing_if = "Option::is_none")]
        pending_user_identifier: Option<String>,
    },
    MfaValidate {
        devices: Vec<DeviceChallenge>,
    },
    Redirect {
        to: String,
    },
    Invitation {
        required: bool,
    },
}

/// What the client must present to complete the current stage. Derived
/// fresh from the session and the resolved binding on every request,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub flow: FlowInfo,
    #[serde(flatten)]
    pub payload: ChallengePayload,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_errors: Vec<FieldError>,
    /// Free-form stage overrides attached by a `Retry` result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<serde_json::Map<String, Value>>,
}

/// Typed client response, one variant per stage kind. Unknown fields are
/// rejected here so stage validators never see malformed input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "component", rename_all = "snake_case", deny_unknown_fields)]
pub enum StageResponse {
    Identification {
        uid_field: String,
        #[serde(default)]
        password: Option<String>,
    },
    Password { password: String },
    MfaValidate {
        device_id: String,
        response: Value,
    },
    Redirect {},
    Invitation {
        #[serde(default)]
        token: Option<String>,
    },
}

impl StageResponse {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Identification { .. } => "identification",
            Self::Password { .. } => "password",
            Self::MfaValidate { .. } => "mfa_validate",
            Self::Redirect {} => "redirect",
            Self::Invitation { .. } => "invitation",
        }
    }
}
