//! Cache-aside lookup of weather payloads.
//!
//! A lookup first asks the cache; a hit is trusted without re-validation for
//! the rest of the entry's lifetime. On a miss the weather service is asked and
//! only accepted payloads are written back, so a rejection is never served from
//! the cache. The cache is an optimisation only: when it errors or times out the
//! resolver carries on as if it were empty.

use std::{future::Future, sync::Arc, time::Duration};

use thiserror::Error;

use crate::{
    cache::{CACHE_TTL, Cache, CacheError},
    domain::{Coordinates, Lookup},
    weather::{Payload, Rejection, SourceError, WeatherSource},
};

/// Where a resolved payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Cache,
    Upstream,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub payload: Payload,
    pub provenance: Provenance,
}

impl Resolved {
    pub fn is_cached(&self) -> bool {
        self.provenance == Provenance::Cache
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Valid(Resolved),
    Invalid(Rejection),
}

/// The weather service could not be reached; distinct from a rejection
#[derive(Debug, Error)]
#[error("weather service unavailable: {0}")]
pub struct Unavailable(pub String);

pub struct CacheAsideResolver {
    cache: Arc<dyn Cache>,
    source: Arc<dyn WeatherSource>,
    ttl: Duration,
    cache_timeout: Duration,
}

impl CacheAsideResolver {
    pub fn new(
        cache: Arc<dyn Cache>,
        source: Arc<dyn WeatherSource>,
        cache_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            source,
            ttl: CACHE_TTL,
            cache_timeout,
        }
    }

    /// Overrides the entry lifetime, meant for tests
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub async fn resolve_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Validation, Unavailable> {
        self.resolve(&Coordinates::new(latitude, longitude).into())
            .await
    }

    #[tracing::instrument(name = "resolver::resolve", skip(self))]
    pub async fn resolve(&self, lookup: &Lookup) -> Result<Validation, Unavailable> {
        let key = lookup.cache_key();

        if let Some(payload) = self.cached(&key).await {
            tracing::debug!(key = %key, "served from cache");
            return Ok(Validation::Valid(Resolved {
                payload,
                provenance: Provenance::Cache,
            }));
        }

        let fetched = match lookup {
            Lookup::Coordinates(coords) => self.source.fetch_by_coordinates(*coords).await,
            Lookup::Name(name) => self.source.fetch_by_name(name).await,
        };

        let payload = match fetched {
            Ok(payload) => payload,
            Err(SourceError::Rejected(rejection)) => {
                tracing::debug!(key = %key, code = rejection.code, "lookup rejected");
                return Ok(Validation::Invalid(rejection));
            }
            Err(SourceError::Unavailable(reason)) => return Err(Unavailable(reason)),
        };

        if let Err(e) = self
            .bounded(self.cache.set(&key, &payload, self.ttl))
            .await
        {
            tracing::warn!(key = %key, error = %e, "failed to populate cache");
        }

        Ok(Validation::Valid(Resolved {
            payload,
            provenance: Provenance::Upstream,
        }))
    }

    /// Drops the cached payload for `lookup`.
    ///
    /// Failures are logged and reported as `false`; a missed invalidation only
    /// leaves an entry that still expires with its ttl.
    #[tracing::instrument(name = "resolver::invalidate", skip(self))]
    pub async fn invalidate(&self, lookup: &Lookup) -> bool {
        let key = lookup.cache_key();

        match self.bounded(self.cache.delete(&key)).await {
            Ok(()) => {
                tracing::debug!(key = %key, "cache entry invalidated");
                true
            }
            Err(e) => {
                tracing::error!(key = %key, error = %e, "failed to invalidate cache entry");
                false
            }
        }
    }

    async fn cached(&self, key: &str) -> Option<Payload> {
        match self.bounded(self.cache.get(key)).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache unavailable, fetching upstream");
                None
            }
        }
    }

    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        tokio::time::timeout(self.cache_timeout, op)
            .await
            .map_err(|_| CacheError::Unavailable("cache operation timed out".to_string()))?
    }
}
