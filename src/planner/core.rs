use std::sync::Arc;

use crate::definition::{FlowDefinitionStore, StageBinding};
use crate::policy::PolicyEngine;
use crate::session::{FlowContext, FlowSession};

use super::errors::PlanningError;

/// Builds resolved plans by filtering a flow's bindings through the
/// policy engine.
pub struct FlowPlanner {
    definitions: Arc<dyn FlowDefinitionStore>,
    policy: Arc<dyn PolicyEngine>,
}

impl FlowPlanner {
    pub fn new(definitions: Arc<dyn FlowDefinitionStore>, policy: Arc<dyn PolicyEngine>) -> Self {
        Self {
            definitions,
            policy,
        }
    }

    /// Whether `binding` applies to `context`. All attached policies must
    /// pass; a binding without policies always applies.
    async fn binding_applies(
        &self,
        binding: &StageBinding,
        context: &FlowContext,
    ) -> Result<bool, PlanningError> {
        for policy in &binding.policies {
            if !self.policy.evaluate(policy, context).await? {
                tracing::debug!(
                    "Binding order={} dropped by policy '{}'",
                    binding.order,
                    policy.0
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Build the initial plan for `flow_id` against `context`.
    ///
    /// Bindings whose `evaluate_on_plan` is false are included without
    /// evaluation; their policies are deferred to replanning during
    /// execution. Declared order is preserved.
    pub async fn plan(
        &self,
        flow_id: &str,
        context: &FlowContext,
    ) -> Result<Vec<StageBinding>, PlanningError> {
        let definition = self
            .definitions
            .get(flow_id)
            .ok_or_else(|| PlanningError::UnknownFlow(flow_id.to_string()))?;

        let mut plan = Vec::with_capacity(definition.bindings.len());
        for binding in definition.bindings {
            if !binding.evaluate_on_plan || self.binding_applies(&binding, context).await? {
                plan.push(binding);
            }
        }

        if plan.is_empty() {
            return Err(PlanningError::EmptyPlan(flow_id.to_string()));
        }
        tracing::debug!("Planned flow '{}' with {} stages", flow_id, plan.len());
        Ok(plan)
    }

    /// Re-filter the not-yet-executed suffix of a session's plan against
    /// its current context. The completed prefix is never touched, and an
    /// empty remaining suffix is valid: the flow simply completes.
    pub async fn replan(&self, session: &FlowSession) -> Result<Vec<StageBinding>, PlanningError> {
        let mut plan: Vec<StageBinding> = session.resolved_plan[..session.plan_index].to_vec();
        for binding in &session.resolved_plan[session.plan_index..] {
            if self.binding_applies(binding, &session.context).await? {
                plan.push(binding.clone());
            }
        }
        tracing::debug!(
            "Replanned session {}: {} of {} stages remain",
            session.token,
            plan.len() - session.plan_index,
            session.resolved_plan.len() - session.plan_index
        );
        Ok(plan)
    }
}
