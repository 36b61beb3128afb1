use thiserror::Error;

/// A malformed response payload, rejected before it reaches a stage
/// validator. Distinct from a validation failure: the session stays at
/// the same plan index and the client may retry with a corrected payload.
#[derive(Debug, Error, Clone)]
pub enum DecodeError {
    #[error("Malformed response payload: {0}")]
    Malformed(String),

    #[error("Response is for stage '{got}', current stage is '{expected}'")]
    WrongStage { expected: String, got: String },
}
