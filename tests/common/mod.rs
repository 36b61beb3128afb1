//! Shared fixtures for flow integration tests: an in-memory world with a
//! couple of users, one password each, and optional TOTP devices.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use authflow::*;

pub const TOTP_CODE: &str = "123456";

pub struct TestUser {
    pub username: &'static str,
    pub password: &'static str,
    pub has_totp: bool,
}

pub const ALICE: TestUser = TestUser {
    username: "alice",
    password: "correct-horse",
    has_totp: true,
};

pub const BOB: TestUser = TestUser {
    username: "bob",
    password: "battery-staple",
    has_totp: false,
};

pub struct World {
    users: Vec<TestUser>,
}

impl World {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            users: vec![ALICE, BOB],
        })
    }

    fn find(&self, username: &str, case_insensitive: bool) -> Option<&TestUser> {
        self.users.iter().find(|u| {
            if case_insensitive {
                u.username.eq_ignore_ascii_case(username)
            } else {
                u.username == username
            }
        })
    }

    fn subject(user: &TestUser) -> Subject {
        let mut attributes = serde_json::Map::new();
        attributes.insert("has_totp".to_string(), Value::Bool(user.has_totp));
        Subject {
            id: format!("id-{}", user.username),
            username: user.username.to_string(),
            email: Some(format!("{}@example.com", user.username)),
            attributes,
        }
    }
}

#[async_trait]
impl SubjectDirectory for World {
    async fn resolve(
        &self,
        identifier: &str,
        fields: &[UserField],
        case_insensitive: bool,
    ) -> Result<Option<Subject>, StageError> {
        if !fields.contains(&UserField::Username) {
            return Ok(None);
        }
        Ok(self.find(identifier, case_insensitive).map(World::subject))
    }
}

#[async_trait]
impl CredentialVerifier for World {
    async fn verify(
        &self,
        _kind: CredentialKind,
        material: &str,
        subject: &Subject,
    ) -> Result<VerifyResult, StageError> {
        match self.find(&subject.username, false) {
            Some(user) if user.password == material => Ok(VerifyResult::Success),
            Some(_) => Ok(VerifyResult::Failure("bad password".to_string())),
            None => Ok(VerifyResult::Failure("unknown subject".to_string())),
        }
    }
}

#[async_trait]
impl DeviceRegistry for World {
    async fn list_devices(&self, subject: &Subject) -> Result<Vec<DeviceDescriptor>, StageError> {
        let has_totp = self
            .find(&subject.username, false)
            .is_some_and(|u| u.has_totp);
        if has_totp {
            Ok(vec![DeviceDescriptor {
                device_id: format!("totp-{}", subject.username),
                class: DeviceClass::Totp,
                name: "Authenticator app".to_string(),
            }])
        } else {
            Ok(Vec::new())
        }
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
        Ok(response.as_str() == Some(TOTP_CODE))
    }
}

/// Policy engine that answers `has_totp` from the pending user's
/// attributes, so replanning can react to who just identified.
pub struct AttributePolicy;

#[async_trait]
impl PolicyEngine for AttributePolicy {
    async fn evaluate(
        &self,
        policy: &PolicyRef,
        context: &FlowContext,
    ) -> Result<bool, PolicyError> {
        Ok(context
            .pending_user()
            .and_then(|s| s.attributes.get(&policy.0).cloned())
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }
}

pub fn identification_binding(order: i32) -> StageBinding {
    StageBinding::new(
        order,
        StageConfig::Identification(IdentificationConfig {
            user_fields: vec![UserField::Username],
            password_stage: false,
            case_insensitive_matching: false,
        }),
    )
}

pub fn password_binding(order: i32) -> StageBinding {
    StageBinding::new(order, StageConfig::Password(PasswordConfig::default()))
}

pub fn mfa_binding(order: i32) -> StageBinding {
    StageBinding::new(
        order,
        StageConfig::MfaValidate(MfaValidateConfig {
            device_classes: vec![DeviceClass::Totp],
            not_configured_action: NotConfiguredAction::Skip,
        }),
    )
}

pub struct EngineHandle {
    pub engine: FlowExecutionEngine,
    pub sessions: Arc<InMemorySessionStore>,
}

/// Build an engine over the test world and the given flows, sharing the
/// session store so tests can inspect persisted state directly.
pub fn engine_with(flows: Vec<FlowDefinition>) -> EngineHandle {
    let sessions = Arc::new(InMemorySessionStore::new());
    let engine = engine_with_store(flows, sessions.clone());
    EngineHandle { engine, sessions }
}

pub fn engine_with_store(
    flows: Vec<FlowDefinition>,
    sessions: Arc<dyn SessionStore>,
) -> FlowExecutionEngine {
    let mut registry = InMemoryFlowRegistry::new();
    for flow in flows {
        registry
            .register(flow)
            .unwrap_or_else(|e| panic!("flow registration failed: {e}"));
    }

    let world = World::new();
    FlowExecutionEngine::new(
        Arc::new(registry),
        Arc::new(AttributePolicy),
        world.clone(),
        world.clone(),
        world,
        sessions,
    )
}

/// Store decorator that holds every `load` at a barrier until the
/// expected number of readers arrive, forcing concurrent submits to
/// observe the same session version.
pub struct BarrierStore {
    inner: Arc<InMemorySessionStore>,
    barrier: tokio::sync::Barrier,
}

impl BarrierStore {
    pub fn new(readers: usize) -> Self {
        Self {
            inner: Arc::new(InMemorySessionStore::new()),
            barrier: tokio::sync::Barrier::new(readers),
        }
    }
}

#[async_trait]
impl SessionStore for BarrierStore {
    async fn init(&self) -> Result<(), StoreError> {
        self.inner.init().await
    }

    async fn load(&self, token: &str) -> Result<Option<(FlowSession, u64)>, StoreError> {
        let loaded = self.inner.load(token).await;
        self.barrier.wait().await;
        loaded
    }

    async fn save(
        &self,
        token: &str,
        session: &FlowSession,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        self.inner.save(token, session, expected_version).await
    }

    async fn delete(&self, token: &str) -> Result<(), StoreError> {
        self.inner.delete(token).await
    }
}

pub fn identification_response(username: &str) -> Value {
    serde_json::json!({ "component": "identification", "uid_field": username })
}

pub fn password_response(password: &str) -> Value {
    serde_json::json!({ "component": "password", "password": password })
}

pub fn mfa_response(device_id: &str, code: &str) -> Value {
    serde_json::json!({ "component": "mfa_validate", "device_id": device_id, "response": code })
}

/// Map of flows most tests share: identification, then password, then an
/// MFA stage gated on the `has_totp` attribute and re-planned after the
/// password stage completes.
pub fn login_flow(flow_id: &str) -> FlowDefinition {
    let mut mfa = mfa_binding(20).with_policy(PolicyRef::new("has_totp"));
    mfa.evaluate_on_plan = false;
    FlowDefinition::new(
        flow_id,
        "login",
        "Welcome back",
        FlowDesignation::Authentication,
        vec![
            identification_binding(0),
            password_binding(10).re_evaluated(),
            mfa,
        ],
    )
}
