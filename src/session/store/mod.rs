mod config;
mod memory;
mod redis;
mod types;

pub use config::session_store_from_env;
pub use types::{InMemorySessionStore, RedisSessionStore, SessionStore, StoreError};
