use thiserror::Error;

/// Infrastructure faults raised by stage collaborators. Validation
/// failures are never errors; they travel as
/// [`StageResult`](super::StageResult) variants.
#[derive(Debug, Error, Clone)]
pub enum StageError {
    #[error("Subject directory error: {0}")]
    Directory(String),

    #[error("Credential verifier error: {0}")]
    Verifier(String),

    #[error("Device registry error: {0}")]
    DeviceRegistry(String),

    #[error("Response does not match the current stage")]
    ResponseMismatch,
}
