use serde::{Deserialize, Serialize};

/// Stable identifier of a flow template. Flows are referenced by id from
/// sessions; the definition itself is never owned by a session.
pub type FlowId = String;

/// Reference to a policy evaluated by the injected [`PolicyEngine`](crate::PolicyEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRef(pub String);

impl PolicyRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// What a flow is used for. Mirrors the designations an administrator can
/// assign when authoring templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowDesignation {
    Authentication,
    Authorization,
    Enrollment,
    Recovery,
    Invalidation,
    Configuration,
}

/// How the engine reacts to an invalid challenge response (a decode error
/// or a stage `Retry`) for a given binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidResponseAction {
    /// Re-issue the same challenge with errors attached.
    #[default]
    Retry,
    /// Re-plan the flow from the beginning with a fresh context.
    Restart,
    /// Re-plan the flow from the beginning but keep accumulated context.
    RestartWithContext,
}

/// How a stage that requires per-user setup behaves when the user has
/// nothing configured (e.g. MFA validation for a user without devices).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotConfiguredAction {
    #[default]
    Skip,
    Deny,
}

/// Device classes a validation stage may accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Totp,
    Static,
    Webauthn,
    Sms,
}

/// Fields an identification stage may match an identifier against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserField {
    Username,
    Email,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentificationConfig {
    /// Match order is the declared order; the first field that resolves wins.
    pub user_fields: Vec<UserField>,
    /// When set, the identification challenge also collects a password and
    /// both are validated in one round-trip.
    #[serde(default)]
    pub password_stage: bool,
    #[serde(default)]
    pub case_insensitive_matching: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordConfig {
    /// Failed attempts before the flow is cancelled.
    pub max_attempts: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self { max_attempts: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MfaValidateConfig {
    pub device_classes: Vec<DeviceClass>,
    #[serde(default)]
    pub not_configured_action: NotConfiguredAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectConfig {
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvitationConfig {
    /// Accepted invitation tokens, compared in constant time.
    pub tokens: Vec<String>,
    /// When true, a missing token advances the flow instead of denying it.
    #[serde(default)]
    pub continue_flow_without_invitation: bool,
}

/// Closed set of stage types. Each variant carries its own typed config;
/// dispatch happens through a single `match` in the stage executor so new
/// stage kinds are exhaustively checked at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageConfig {
    Identification(IdentificationConfig),
    Password(PasswordConfig),
    MfaValidate(MfaValidateConfig),
    Redirect(RedirectConfig),
    Invitation(InvitationConfig),
}

impl StageConfig {
    /// Wire name of the stage kind, used as the challenge `component` tag.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Identification(_) => "identification",
            Self::Password(_) => "password",
            Self::MfaValidate(_) => "mfa_validate",
            Self::Redirect(_) => "redirect",
            Self::Invitation(_) => "invitation",
        }
    }
}

/// Relationship between a flow and one stage. Order is unique per flow;
/// policies decide whether the binding applies to the current context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageBinding {
    pub order: i32,
    pub stage: StageConfig,
    #[serde(default)]
    pub policies: Vec<PolicyRef>,
    /// Evaluate `policies` while the plan is built.
    #[serde(default = "default_true")]
    pub evaluate_on_plan: bool,
    /// Re-filter the remaining plan suffix after this stage completes.
    #[serde(default)]
    pub re_evaluate_policies: bool,
    #[serde(default)]
    pub invalid_response_action: InvalidResponseAction,
    /// Per-stage timeout override in seconds; falls back to `FLOW_STAGE_TIMEOUT`.
    #[serde(default)]
    pub stage_timeout: Option<i64>,
}

fn default_true() -> bool {
    true
}

impl StageBinding {
    pub fn new(order: i32, stage: StageConfig) -> Self {
        Self {
            order,
            stage,
            policies: Vec::new(),
            evaluate_on_plan: true,
            re_evaluate_policies: false,
            invalid_response_action: InvalidResponseAction::Retry,
            stage_timeout: None,
        }
    }

    pub fn with_policy(mut self, policy: PolicyRef) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn re_evaluated(mut self) -> Self {
        self.re_evaluate_policies = true;
        self
    }
}

/// Immutable flow template: an ordered stage list plus metadata. Created
/// and updated by administrators out of band; read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDefinition {
    pub flow_id: FlowId,
    pub slug: String,
    pub title: String,
    pub designation: FlowDesignation,
    pub bindings: Vec<StageBinding>,
}

impl FlowDefinition {
    pub fn new(
        flow_id: impl Into<String>,
        slug: impl Into<String>,
        title: impl Into<String>,
        designation: FlowDesignation,
        mut bindings: Vec<StageBinding>,
    ) -> Self {
        bindings.sort_by_key(|b| b.order);
        Self {
            flow_id: flow_id.into(),
            slug: slug.into(),
            title: title.into(),
            designation,
            bindings,
        }
    }
}
