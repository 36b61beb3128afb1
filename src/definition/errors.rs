use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum DefinitionError {
    #[error("Unknown flow: {0}")]
    UnknownFlow(String),

    #[error("Duplicate flow id: {0}")]
    DuplicateFlow(String),
}
