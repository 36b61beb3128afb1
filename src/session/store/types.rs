use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::session::types::FlowSession;

#[derive(Debug, Error, Clone)]
pub enum StoreError {
    /// Transient infrastructure fault; the engine retries these with
    /// bounded backoff.
    #[error("Store backend error: {0}")]
    Backend(String),

    /// Version mismatch on compare-and-swap. Never retried automatically.
    #[error("Concurrent modification")]
    Conflict,

    #[error("Json conversion(Serde) error: {0}")]
    Serde(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

/// Durable keyed storage for in-flight flow sessions.
///
/// Writes are guarded by an optimistic version: `save` with
/// `expected_version == 0` creates the entry and fails with
/// [`StoreError::Conflict`] if it already exists; any other value must
/// match the version returned by the `load` that preceded it. This is the
/// sole concurrency-control point of the engine: two concurrent submits
/// for the same token cannot both advance the plan.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Verify the backend is reachable.
    async fn init(&self) -> Result<(), StoreError>;

    /// Load a session and its current version.
    async fn load(&self, token: &str) -> Result<Option<(FlowSession, u64)>, StoreError>;

    /// Compare-and-swap save. Returns the new version on success.
    async fn save(
        &self,
        token: &str,
        session: &FlowSession,
        expected_version: u64,
    ) -> Result<u64, StoreError>;

    /// Remove a session. Removing a missing token is not an error.
    async fn delete(&self, token: &str) -> Result<(), StoreError>;
}

pub struct InMemorySessionStore {
    pub(super) entries: Mutex<HashMap<String, (String, u64)>>,
}

pub struct RedisSessionStore {
    pub(super) client: redis::Client,
}
