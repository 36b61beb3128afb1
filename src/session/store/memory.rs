use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::session::types::FlowSession;

use super::types::{InMemorySessionStore, SessionStore, StoreError};

const STORE_PREFIX: &str = "authflow";

impl InMemorySessionStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory session store");
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn make_key(token: &str) -> String {
        format!("{STORE_PREFIX}:session:{token}")
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn init(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn load(&self, token: &str) -> Result<Option<(FlowSession, u64)>, StoreError> {
        let entries = self.entries.lock().await;
        match entries.get(&Self::make_key(token)) {
            Some((data, version)) => {
                let session: FlowSession = serde_json::from_str(data)?;
                Ok(Some((session, *version)))
            }
            None => Ok(None),
        }
    }

    async fn save(
        &self,
        token: &str,
        session: &FlowSession,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let data = serde_json::to_string(session)?;
        let key = Self::make_key(token);
        let mut entries = self.entries.lock().await;
        match entries.get(&key) {
            None if expected_version == 0 => {
                entries.insert(key, (data, 1));
                Ok(1)
            }
            None => Err(StoreError::Conflict),
            Some((_, current)) if *current == expected_version && expected_version != 0 => {
                let next = current + 1;
                entries.insert(key, (data, next));
                Ok(next)
            }
            Some(_) => Err(StoreError::Conflict),
        }
    }

    async fn delete(&self, token: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        entries.remove(&Self::make_key(token));
        Ok(())
    }
}
