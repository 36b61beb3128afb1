mod errors;
mod registry;
mod types;

pub use errors::DefinitionError;
pub use registry::{FlowDefinitionStore, InMemoryFlowRegistry};
pub use types::{
    DeviceClass, FlowDefinition, FlowDesignation, FlowId, IdentificationConfig,
    InvalidResponseAction, InvitationConfig, MfaValidateConfig, NotConfiguredAction,
    PasswordConfig, PolicyRef, RedirectConfig, StageBinding, StageConfig, UserField,
};
