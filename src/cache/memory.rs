use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use moka::{Expiry, future::Cache as MokaStore};

use super::{Cache, CacheError};
use crate::weather::Payload;

const MAX_ENTRIES: u64 = 10_000;

#[derive(Clone)]
struct Entry {
    payload: Arc<Payload>,
    ttl: Duration,
}

/// Expires each entry after the ttl it was written with
struct EntryExpiry;

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process cache, used when no remote cache is configured or reachable
#[derive(Clone)]
pub struct MokaCache {
    inner: MokaStore<String, Entry>,
}

impl MokaCache {
    pub fn new() -> Self {
        Self::with_capacity(MAX_ENTRIES)
    }

    pub fn with_capacity(max_entries: u64) -> Self {
        Self {
            inner: MokaStore::builder()
                .max_capacity(max_entries)
                .expire_after(EntryExpiry)
                .build(),
        }
    }
}

impl Default for MokaCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for MokaCache {
    async fn get(&self, key: &str) -> Result<Option<Payload>, CacheError> {
        Ok(self
            .inner
            .get(key)
            .await
            .map(|entry| entry.payload.as_ref().clone()))
    }

    async fn set(&self, key: &str, payload: &Payload, ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            payload: Arc::new(payload.clone()),
            ttl,
        };
        self.inner.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.inner.invalidate(key).await;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::cache::CACHE_TTL;

    #[tokio::test]
    async fn set_then_get() {
        let cache = MokaCache::new();
        let payload = json!({ "cod": 200, "name": "Bengaluru" });

        cache.set("12.9716_77.5946", &payload, CACHE_TTL).await.unwrap();

        assert_eq!(cache.get("12.9716_77.5946").await.unwrap(), Some(payload));
        assert_eq!(cache.get("1_1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_overwrites() {
        let cache = MokaCache::new();

        cache.set("1_1", &json!({ "v": 1 }), CACHE_TTL).await.unwrap();
        cache.set("1_1", &json!({ "v": 2 }), CACHE_TTL).await.unwrap();

        assert_eq!(cache.get("1_1").await.unwrap(), Some(json!({ "v": 2 })));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let cache = MokaCache::new();

        cache.set("3_3", &json!({ "cod": 200 }), CACHE_TTL).await.unwrap();
        cache.delete("3_3").await.unwrap();
        cache.delete("3_3").await.unwrap();
        cache.delete("never_set").await.unwrap();

        assert_eq!(cache.get("3_3").await.unwrap(), None);
    }

    #[tokio::test]
    async fn entry_expires_after_ttl() {
        let cache = MokaCache::new();

        cache
            .set("5_5", &json!({ "cod": 200 }), Duration::from_millis(100))
            .await
            .unwrap();
        assert!(cache.get("5_5").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(cache.get("5_5").await.unwrap(), None);
    }

    #[tokio::test]
    async fn overwrite_restarts_countdown() {
        let cache = MokaCache::new();

        cache
            .set("6_6", &json!({ "v": 1 }), Duration::from_millis(100))
            .await
            .unwrap();
        cache
            .set("6_6", &json!({ "v": 2 }), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(cache.get("6_6").await.unwrap(), Some(json!({ "v": 2 })));
    }
}
