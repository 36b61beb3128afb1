//! Policy engine collaborator interface.
//!
//! Policies decide whether a stage binding applies to the current flow
//! context. Evaluation is a pure predicate: no side effects, bounded
//! execution time enforced by the implementation.

use async_trait::async_trait;
use thiserror::Error;

use crate::definition::PolicyRef;
use crate::session::FlowContext;

#[derive(Debug, Error, Clone)]
pub enum PolicyError {
    #[error("Policy evaluation failed: {0}")]
    Evaluation(String),

    #[error("Unknown policy: {0}")]
    UnknownPolicy(String),
}

#[async_trait]
pub trait PolicyEngine: Send + Sync + 'static {
    async fn evaluate(
        &self,
        policy: &PolicyRef,
        context: &FlowContext,
    ) -> Result<bool, PolicyError>;
}

/// Policy engine that passes every binding. Useful as the default for
/// flows whose bindings carry no policies.
pub struct AllowAll;

#[async_trait]
impl PolicyEngine for AllowAll {
    async fn evaluate(
        &self,
        _policy: &PolicyRef,
        _context: &FlowContext,
    ) -> Result<bool, PolicyError> {
        Ok(true)
    }
}

/// Policy engine that resolves a policy ref as a boolean flag stored in
/// the flow context under the same name. A missing key evaluates false.
pub struct ContextFlagPolicy;

#[async_trait]
impl PolicyEngine for ContextFlagPolicy {
    async fn evaluate(
        &self,
        policy: &PolicyRef,
        context: &FlowContext,
    ) -> Result<bool, PolicyError> {
        let passing = context
            .get(&policy.0)
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        tracing::debug!("Policy '{}' evaluated to {}", policy.0, passing);
        Ok(passing)
    }
}
