use thiserror::Error;

use crate::challenge::DecodeError;
use crate::planner::PlanningError;
use crate::session::{SessionError, SessionStatus, StoreError};
use crate::stage::{StageError, TerminateReason};

/// Aggregate error surface of the execution engine. Everything a caller
/// can observe goes through here; stage validation failures do not (they
/// come back as re-issued challenges, not errors).
#[derive(Debug, Error, Clone)]
pub enum FlowError {
    #[error("Planning error: {0}")]
    Planning(#[from] PlanningError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The session was modified by another request between load and save.
    /// Never retried automatically; the client must re-fetch.
    #[error("Session was modified concurrently")]
    ConcurrentModification,

    #[error("Session is '{0}', expected in progress")]
    InvalidState(SessionStatus),

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session expired")]
    SessionExpired,

    #[error("Stage challenge timed out")]
    StageTimeout,

    #[error("Flow terminated: {0}")]
    FlowTerminated(TerminateReason),

    #[error("Stage error: {0}")]
    Stage(#[from] StageError),

    /// Transient store fault that survived the retry budget.
    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}
