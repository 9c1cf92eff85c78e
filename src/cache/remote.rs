use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, RedisError, aio::ConnectionManager};

use super::{Cache, CacheError};
use crate::weather::Payload;

impl From<RedisError> for CacheError {
    fn from(error: RedisError) -> Self {
        CacheError::Unavailable(error.to_string())
    }
}

/// Redis-backed cache; entries are JSON strings written with `SET key value EX ttl`
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connects eagerly so a bad url or unreachable server surfaces at startup
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Payload>, CacheError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key).await?;

        raw.map(|value| serde_json::from_str(&value).map_err(CacheError::from))
            .transpose()
    }

    async fn set(&self, key: &str, payload: &Payload, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let value = serde_json::to_string(payload)?;
        // EX takes whole seconds, zero would be rejected by the server
        let seconds = ttl.as_secs().max(1);

        let _: () = conn.set_ex(key, value, seconds).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}
