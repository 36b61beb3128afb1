//! authflow - Flow execution engine for multi-step authentication
//!
//! This crate turns declarative flow definitions (identification,
//! password, MFA validation, redirect, invitation stages bound by
//! policies) into per-session execution plans and drives clients
//! through them challenge by challenge, with optimistic-concurrency
//! session persistence in memory or Redis.

mod challenge;
mod config;
mod definition;
mod engine;
mod planner;
mod policy;
mod session;
mod stage;
#[cfg(test)]
mod test_utils;
mod utils;

pub use challenge::{
    Challenge, ChallengePayload, DecodeError, DeviceChallenge, FieldError, FlowInfo,
    StageResponse, decode as decode_response, encode as encode_challenge,
};
pub use definition::{
    DefinitionError, DeviceClass, FlowDefinition, FlowDefinitionStore, FlowDesignation, FlowId,
    IdentificationConfig, InMemoryFlowRegistry, InvalidResponseAction, InvitationConfig,
    MfaValidateConfig, NotConfiguredAction, PasswordConfig, PolicyRef, RedirectConfig,
    StageBinding, StageConfig, UserField,
};
pub use engine::{FlowError, FlowExecutionEngine, StartOutcome, SubmitOutcome};
pub use planner::{FlowPlanner, PlanningError};
pub use policy::{AllowAll, ContextFlagPolicy, PolicyEngine, PolicyError};
pub use session::{
    FlowContext, FlowSession, InMemorySessionStore, RedisSessionStore, SessionError,
    SessionStatus, SessionStore, StoreError, Subject, keys, session_store_from_env,
};
pub use stage::{
    CredentialKind, CredentialVerifier, DeviceDescriptor, DeviceRegistry, StageError,
    StageExecutor, StageResult, SubjectDirectory, TerminateReason, VerifyResult,
};
