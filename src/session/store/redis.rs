use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;

use crate::session::types::FlowSession;

use super::types::{RedisSessionStore, SessionStore, StoreError};

const STORE_PREFIX: &str = "authflow";

/// Compare-and-swap over a hash with `version` and `data` fields.
/// ARGV: expected version (0 creates), serialized session, TTL seconds.
/// Returns the new version, or -1 on a version mismatch.
const CAS_SCRIPT: &str = r#"
local v = redis.call('HGET', KEYS[1], 'version')
if not v then
  if tonumber(ARGV[1]) == 0 then
    redis.call('HSET', KEYS[1], 'version', 1, 'data', ARGV[2])
    redis.call('EXPIRE', KEYS[1], ARGV[3])
    return 1
  end
  return -1
end
if tonumber(v) == tonumber(ARGV[1]) and tonumber(ARGV[1]) ~= 0 then
  local nv = tonumber(v) + 1
  redis.call('HSET', KEYS[1], 'version', nv, 'data', ARGV[2])
  redis.call('EXPIRE', KEYS[1], ARGV[3])
  return nv
end
return -1
"#;

impl RedisSessionStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn make_key(token: &str) -> String {
        format!("{STORE_PREFIX}:session:{token}")
    }

    /// Keep the Redis key alive exactly as long as the session itself.
    fn ttl_seconds(session: &FlowSession) -> i64 {
        (session.expires_at - Utc::now()).num_seconds().max(1)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn init(&self) -> Result<(), StoreError> {
        let _conn = self.client.get_multiplexed_async_connection().await?;
        Ok(())
    }

    async fn load(&self, token: &str) -> Result<Option<(FlowSession, u64)>, StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = Self::make_key(token);

        let result: Vec<Option<String>> = conn.hget(&key, &["version", "data"]).await?;
        match (result.first().cloned().flatten(), result.get(1).cloned().flatten()) {
            (Some(version), Some(data)) => {
                let version: u64 = version
                    .parse()
                    .map_err(|_| StoreError::Backend("Corrupt version field".to_string()))?;
                let session: FlowSession = serde_json::from_str(&data)?;
                Ok(Some((session, version)))
            }
            _ => Ok(None),
        }
    }

    async fn save(
        &self,
        token: &str,
        session: &FlowSession,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = Self::make_key(token);
        let data = serde_json::to_string(session)?;

        let script = redis::Script::new(CAS_SCRIPT);
        let result: i64 = script
            .key(&key)
            .arg(expected_version)
            .arg(&data)
            .arg(Self::ttl_seconds(session))
            .invoke_async(&mut conn)
            .await?;

        if result < 0 {
            return Err(StoreError::Conflict);
        }
        Ok(result as u64)
    }

    async fn delete(&self, token: &str) -> Result<(), StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(Self::make_key(token)).await?;
        Ok(())
    }
}
