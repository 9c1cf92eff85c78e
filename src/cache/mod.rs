use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::weather::Payload;

mod memory;
mod remote;

pub use memory::MokaCache;
pub use remote::RedisCache;

/// Lifetime of every cached weather payload
pub const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
    #[error("cached payload is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Key/value store for weather payloads with per-entry expiry.
///
/// Expired entries are never returned by `get`; the store enforces expiry,
/// not the caller.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Returns `Ok(None)` on a miss or an expired entry
    async fn get(&self, key: &str) -> Result<Option<Payload>, CacheError>;

    /// Overwrites any existing entry and restarts its expiry countdown
    async fn set(&self, key: &str, payload: &Payload, ttl: Duration) -> Result<(), CacheError>;

    /// Idempotent; removing an absent key is not an error
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
