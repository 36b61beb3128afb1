mod context;
mod errors;
mod store;
mod types;

pub use context::{FlowContext, Subject, keys};
pub use errors::SessionError;
pub use store::{
    InMemorySessionStore, RedisSessionStore, SessionStore, StoreError, session_store_from_env,
};
pub use types::{FlowSession, SessionStatus};
