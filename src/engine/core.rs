use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;

use crate::challenge::{self, Challenge};
use crate::config::{
    FLOW_SESSION_TOKEN_LENGTH, FLOW_STORE_MAX_RETRIES, FLOW_STORE_RETRY_BASE_MS,
};
use crate::definition::{
    FlowDefinition, FlowDefinitionStore, InvalidResponseAction, StageConfig,
};
use crate::planner::{FlowPlanner, PlanningError};
use crate::policy::PolicyEngine;
use crate::session::{
    FlowContext, FlowSession, SessionStore, SessionStatus, StoreError, keys,
};
use crate::stage::{
    CredentialVerifier, DeviceRegistry, StageExecutor, StageResult, SubjectDirectory,
    TerminateReason,
};
use crate::utils::gen_random_string;

use super::errors::FlowError;
use super::types::{StartOutcome, SubmitOutcome};

/// Drives flow sessions from `start` to completion.
///
/// The engine holds no per-session state of its own; every request loads
/// the session, works on the copy, and persists it with a
/// compare-and-swap. Collaborators are injected so the engine can run
/// against any directory, verifier, or store backend.
pub struct FlowExecutionEngine {
    definitions: Arc<dyn FlowDefinitionStore>,
    planner: FlowPlanner,
    executor: StageExecutor,
    devices: Arc<dyn DeviceRegistry>,
    sessions: Arc<dyn SessionStore>,
}

impl FlowExecutionEngine {
    pub fn new(
        definitions: Arc<dyn FlowDefinitionStore>,
        policy: Arc<dyn PolicyEngine>,
        subjects: Arc<dyn SubjectDirectory>,
        credentials: Arc<dyn CredentialVerifier>,
        devices: Arc<dyn DeviceRegistry>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            planner: FlowPlanner::new(definitions.clone(), policy),
            executor: StageExecutor::new(subjects, credentials, devices.clone()),
            definitions,
            devices,
            sessions,
        }
    }

    /// Plan the flow and open a session for it. Planning failures leave
    /// nothing behind; no session is persisted until the plan is known
    /// to be non-empty.
    pub async fn start(
        &self,
        flow_id: &str,
        initial_context: FlowContext,
    ) -> Result<StartOutcome, FlowError> {
        let definition = self.definition(flow_id)?;
        let plan = self.planner.plan(flow_id, &initial_context).await?;

        let token = gen_random_string(*FLOW_SESSION_TOKEN_LENGTH)
            .map_err(crate::session::SessionError::from)?;
        let mut session = FlowSession::new(
            token.clone(),
            flow_id.to_string(),
            plan,
            initial_context,
        );
        session.status = SessionStatus::InProgress;

        self.prepare_stage(&mut session).await?;
        session.mark_challenge_issued(Utc::now());
        self.persist(&session, 0).await?;

        let challenge = self.issue(&session, &definition)?;
        tracing::info!("Started flow '{}' as session {}", flow_id, session.token);
        Ok(StartOutcome { token, challenge })
    }

    /// Validate a raw client response against the session's current stage
    /// and move the session forward.
    pub async fn submit(&self, token: &str, raw: &Value) -> Result<SubmitOutcome, FlowError> {
        let (mut session, version) = self
            .load(token)
            .await?
            .ok_or(FlowError::SessionNotFound)?;

        if session.status != SessionStatus::InProgress {
            return Err(FlowError::InvalidState(session.status));
        }

        // Session expiry is checked before the per-stage timer so an
        // overdue session never reports the narrower timeout.
        let now = Utc::now();
        if session.is_expired(now) {
            session.status = SessionStatus::Expired;
            self.persist(&session, version).await?;
            return Err(FlowError::SessionExpired);
        }
        if session.stage_timed_out(now) {
            session.status = SessionStatus::Cancelled;
            session.termination_reason = Some(TerminateReason::StageTimeout.to_string());
            self.persist(&session, version).await?;
            return Err(FlowError::StageTimeout);
        }

        let Some(binding) = session.current_binding().cloned() else {
            return Err(FlowError::InvalidState(session.status));
        };
        let definition = self.definition(&session.flow_id)?;

        let response = match challenge::decode(&binding, raw) {
            Ok(response) => response,
            Err(err) => {
                return match binding.invalid_response_action {
                    InvalidResponseAction::Retry => Err(FlowError::Decode(err)),
                    InvalidResponseAction::Restart => {
                        self.restart(session, version, &definition, false).await
                    }
                    InvalidResponseAction::RestartWithContext => {
                        self.restart(session, version, &definition, true).await
                    }
                };
            }
        };

        match self.executor.execute(&session, &binding, &response).await? {
            StageResult::Advance(updates) => {
                session.context.merge(updates);
                session.plan_index += 1;
                if binding.re_evaluate_policies {
                    session.resolved_plan = self.planner.replan(&session).await?;
                }
                session.challenge_issued_at = None;

                if session.plan_index >= session.resolved_plan.len() {
                    return self.complete(session, version).await;
                }

                self.prepare_stage(&mut session).await?;
                session.mark_challenge_issued(Utc::now());
                self.persist(&session, version).await?;
                Ok(SubmitOutcome::Challenge(self.issue(&session, &definition)?))
            }
            StageResult::Retry {
                errors,
                overrides,
                updates,
            } => match binding.invalid_response_action {
                InvalidResponseAction::Restart => {
                    self.restart(session, version, &definition, false).await
                }
                InvalidResponseAction::RestartWithContext => {
                    self.restart(session, version, &definition, true).await
                }
                InvalidResponseAction::Retry => {
                    session.context.merge(updates);
                    self.persist(&session, version).await?;
                    let mut challenge = self.issue(&session, &definition)?;
                    challenge.response_errors = errors;
                    challenge.overrides = overrides;
                    Ok(SubmitOutcome::Challenge(challenge))
                }
            },
            StageResult::Redirect(target) => {
                session
                    .context
                    .insert(keys::REDIRECT, serde_json::json!(target));
                self.complete(session, version).await
            }
            StageResult::Terminate(reason) => {
                session.status = SessionStatus::Cancelled;
                session.termination_reason = Some(reason.to_string());
                self.persist(&session, version).await?;
                tracing::info!("Session {} terminated: {}", session.token, reason);
                Err(FlowError::FlowTerminated(reason))
            }
        }
    }

    /// Cooperatively cancel an in-flight session. Cancelling a session
    /// that already reached a terminal state is an idempotent ack.
    pub async fn cancel(&self, token: &str) -> Result<(), FlowError> {
        let Some((mut session, version)) = self.load(token).await? else {
            return Err(FlowError::SessionNotFound);
        };
        if session.status.is_terminal() {
            return Ok(());
        }
        session.status = SessionStatus::Cancelled;
        self.persist(&session, version).await?;
        tracing::info!("Session {} cancelled", token);
        Ok(())
    }

    /// Transition one overdue `InProgress` session to `Expired`. Idempotent:
    /// missing, non-running, and not-yet-due sessions are all left as they are.
    pub async fn expire(&self, token: &str) -> Result<bool, FlowError> {
        let Some((mut session, version)) = self.load(token).await? else {
            return Ok(false);
        };
        if session.status != SessionStatus::InProgress || !session.is_expired(Utc::now()) {
            return Ok(false);
        }
        session.status = SessionStatus::Expired;
        self.persist(&session, version).await?;
        tracing::debug!("Session {} expired", token);
        Ok(true)
    }

    /// Background sweep over a set of candidate tokens. Returns how many
    /// sessions were transitioned.
    pub async fn sweep_expired(&self, tokens: &[String]) -> Result<usize, FlowError> {
        let mut swept = 0;
        for token in tokens {
            if self.expire(token).await? {
                swept += 1;
            }
        }
        Ok(swept)
    }

    fn definition(&self, flow_id: &str) -> Result<FlowDefinition, FlowError> {
        self.definitions
            .get(flow_id)
            .ok_or_else(|| PlanningError::UnknownFlow(flow_id.to_string()).into())
    }

    fn issue(
        &self,
        session: &FlowSession,
        definition: &FlowDefinition,
    ) -> Result<Challenge, FlowError> {
        let binding = session
            .current_binding()
            .ok_or(FlowError::InvalidState(session.status))?;
        Ok(challenge::encode(session, binding, definition))
    }

    /// Fetch whatever the upcoming stage needs into the context before
    /// its challenge is issued. Keeps challenge encoding itself pure.
    async fn prepare_stage(&self, session: &mut FlowSession) -> Result<(), FlowError> {
        let Some(binding) = session.current_binding() else {
            return Ok(());
        };
        let StageConfig::MfaValidate(config) = &binding.stage else {
            return Ok(());
        };
        let classes = config.device_classes.clone();

        let Some(subject) = session.context.pending_user() else {
            session.context.insert(keys::MFA_DEVICES, serde_json::json!([]));
            return Ok(());
        };

        let mut offered = Vec::new();
        for device in self.devices.list_devices(&subject).await? {
            if !classes.contains(&device.class) {
                continue;
            }
            let challenge = self.devices.begin_challenge(&device).await?;
            offered.push(crate::challenge::DeviceChallenge { device, challenge });
        }
        session.context.insert(
            keys::MFA_DEVICES,
            serde_json::to_value(&offered).unwrap_or(serde_json::json!([])),
        );
        Ok(())
    }

    /// Throw the session back to its first stage, replanning from the
    /// definition. `keep_context` distinguishes `RestartWithContext`
    /// from a clean restart.
    async fn restart(
        &self,
        mut session: FlowSession,
        version: u64,
        definition: &FlowDefinition,
        keep_context: bool,
    ) -> Result<SubmitOutcome, FlowError> {
        let context = if keep_context {
            session.context.clone()
        } else {
            FlowContext::new()
        };
        let plan = self.planner.plan(&session.flow_id, &context).await?;

        tracing::info!(
            "Restarting session {} (keep_context={})",
            session.token,
            keep_context
        );
        session.resolved_plan = plan;
        session.plan_index = 0;
        session.context = context;
        session.challenge_issued_at = None;

        self.prepare_stage(&mut session).await?;
        session.mark_challenge_issued(Utc::now());
        self.persist(&session, version).await?;
        Ok(SubmitOutcome::Challenge(self.issue(&session, definition)?))
    }

    async fn complete(
        &self,
        mut session: FlowSession,
        version: u64,
    ) -> Result<SubmitOutcome, FlowError> {
        session.status = SessionStatus::Completed;
        let redirect = session.context.redirect();
        self.persist(&session, version).await?;
        tracing::info!("Session {} completed", session.token);
        Ok(SubmitOutcome::Completed { redirect })
    }

    async fn load(&self, token: &str) -> Result<Option<(FlowSession, u64)>, FlowError> {
        let mut attempt = 0u32;
        loop {
            match self.sessions.load(token).await {
                Ok(found) => return Ok(found),
                Err(StoreError::Backend(msg)) if attempt + 1 < *FLOW_STORE_MAX_RETRIES => {
                    attempt += 1;
                    tracing::warn!("Session load attempt {} failed: {}", attempt, msg);
                    tokio::time::sleep(backoff_delay(attempt)).await;
                }
                Err(err) => return Err(FlowError::Store(err)),
            }
        }
    }

    /// Persist with bounded backoff on transient faults. A version
    /// conflict is a logic outcome, not a fault; it surfaces immediately
    /// as `ConcurrentModification`.
    async fn persist(&self, session: &FlowSession, expected_version: u64) -> Result<u64, FlowError> {
        let mut attempt = 0u32;
        loop {
            match self
                .sessions
                .save(&session.token, session, expected_version)
                .await
            {
                Ok(version) => return Ok(version),
                Err(StoreError::Conflict) => return Err(FlowError::ConcurrentModification),
                Err(StoreError::Backend(msg)) if attempt + 1 < *FLOW_STORE_MAX_RETRIES => {
                    attempt += 1;
                    tracing::warn!("Session save attempt {} failed: {}", attempt, msg);
                    tokio::time::sleep(backoff_delay(attempt)).await;
                }
                Err(err) => return Err(FlowError::Store(err)),
            }
        }
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(*FLOW_STORE_RETRY_BASE_MS * (1u64 << (attempt - 1).min(16)))
}
