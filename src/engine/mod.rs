//! The execution engine: ties planning, challenge encoding, stage
//! validation, and session persistence into the `start`/`submit` loop.

mod core;
mod errors;
mod types;

pub use core::FlowExecutionEngine;
pub use errors::FlowError;
pub use types::{StartOutcome, SubmitOutcome};
