//! Stage validators and the executor that dispatches to them.
//!
//! Each stage kind gets one validator function, kept private to this
//! module; [`StageExecutor`] is the only entry point. Validators return
//! [`StageResult`], never errors, for anything the client can cause.

mod errors;
mod executor;
mod identification;
mod invitation;
mod mfa_validate;
mod password;
mod redirect;
mod types;
mod verifier;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::StageError;
pub use executor::StageExecutor;
pub use types::{StageResult, TerminateReason};
pub use verifier::{
    CredentialKind, CredentialVerifier, DeviceDescriptor, DeviceRegistry, SubjectDirectory,
    VerifyResult,
};
