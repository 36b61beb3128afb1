use std::sync::Arc;

use super::types::{InMemorySessionStore, RedisSessionStore, SessionStore, StoreError};

/// Build a session store from `FLOW_SESSION_STORE_TYPE` /
/// `FLOW_SESSION_STORE_URL`. Supported types are `memory` (default) and
/// `redis`. The resulting store is injected into the engine rather than
/// held as a process-wide global so tests can run isolated instances.
pub async fn session_store_from_env() -> Result<Arc<dyn SessionStore>, StoreError> {
    let store_type =
        std::env::var("FLOW_SESSION_STORE_TYPE").unwrap_or_else(|_| "memory".to_string());

    tracing::info!("Initializing session store with type: {}", store_type);

    let store: Arc<dyn SessionStore> = match store_type.as_str() {
        "memory" => Arc::new(InMemorySessionStore::new()),
        "redis" => {
            let url = std::env::var("FLOW_SESSION_STORE_URL").map_err(|_| {
                StoreError::Backend(
                    "FLOW_SESSION_STORE_URL must be set for the redis store".to_string(),
                )
            })?;
            let client = redis::Client::open(url.as_str())?;
            let store = RedisSessionStore::new(client);
            store.init().await?;
            Arc::new(store)
        }
        t => {
            return Err(StoreError::Backend(format!(
                "Unsupported session store type: {t}. Supported types are 'memory' and 'redis'"
            )));
        }
    };

    Ok(store)
}
