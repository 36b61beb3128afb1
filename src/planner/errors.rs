use thiserror::Error;

use crate::policy::PolicyError;

#[derive(Debug, Error, Clone)]
pub enum PlanningError {
    #[error("Unknown flow: {0}")]
    UnknownFlow(String),

    /// Every binding was filtered out at initial planning time. A flow
    /// with nothing to execute cannot be started.
    #[error("Flow '{0}' produced an empty plan")]
    EmptyPlan(String),

    #[error(transparent)]
    Policy(#[from] PolicyError),
}
