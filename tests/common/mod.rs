#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use location_weather::{
    cache::{Cache, CacheError, MokaCache},
    domain::{Coordinates, LocationFields, LocationName},
    resolver::CacheAsideResolver,
    services::LocationService,
    store::{LocationStore, MemoryLocationStore},
    weather::{Payload, Rejection, SourceError, WeatherSource},
};
use serde_json::json;

pub const CACHE_TIMEOUT: Duration = Duration::from_millis(100);

pub fn weather(name: &str) -> Payload {
    json!({
        "cod": 200,
        "name": name,
        "weather": [{ "main": "Clear", "description": "clear sky" }],
        "main": { "temp": 24.3, "humidity": 60 },
    })
}

pub fn fields(name: &str, latitude: Option<f64>, longitude: Option<f64>) -> LocationFields {
    LocationFields {
        name: LocationName::parse(name).unwrap(),
        latitude,
        longitude,
    }
}

#[derive(Clone)]
pub enum Behaviour {
    Valid(Payload),
    Invalid(Rejection),
    Unavailable,
}

/// Weather source answering with a configurable outcome and counting calls
pub struct StubSource {
    behaviour: Mutex<Behaviour>,
    by_coordinates: AtomicUsize,
    by_name: AtomicUsize,
}

impl StubSource {
    pub fn valid(payload: Payload) -> Self {
        Self::new(Behaviour::Valid(payload))
    }

    pub fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour: Mutex::new(behaviour),
            by_coordinates: AtomicUsize::new(0),
            by_name: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, behaviour: Behaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    pub fn calls(&self) -> usize {
        self.coordinate_calls() + self.name_calls()
    }

    pub fn coordinate_calls(&self) -> usize {
        self.by_coordinates.load(Ordering::SeqCst)
    }

    pub fn name_calls(&self) -> usize {
        self.by_name.load(Ordering::SeqCst)
    }

    fn answer(&self) -> Result<Payload, SourceError> {
        match self.behaviour.lock().unwrap().clone() {
            Behaviour::Valid(payload) => Ok(payload),
            Behaviour::Invalid(rejection) => Err(SourceError::Rejected(rejection)),
            Behaviour::Unavailable => Err(SourceError::Unavailable("connection refused".into())),
        }
    }
}

#[async_trait]
impl WeatherSource for StubSource {
    async fn fetch_by_coordinates(&self, _coords: Coordinates) -> Result<Payload, SourceError> {
        self.by_coordinates.fetch_add(1, Ordering::SeqCst);
        // Let concurrent callers interleave, as a network round-trip would
        tokio::task::yield_now().await;
        self.answer()
    }

    async fn fetch_by_name(&self, _name: &str) -> Result<Payload, SourceError> {
        self.by_name.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.answer()
    }
}

/// In-process cache that counts the operations issued against it
#[derive(Default)]
pub struct CountingCache {
    inner: MokaCache,
    gets: AtomicUsize,
    sets: AtomicUsize,
    deletes: AtomicUsize,
}

impl CountingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads straight from the backing cache without counting
    pub async fn peek(&self, key: &str) -> Option<Payload> {
        self.inner.get(key).await.unwrap()
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Cache for CountingCache {
    async fn get(&self, key: &str) -> Result<Option<Payload>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, payload: &Payload, ttl: Duration) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, payload, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }
}

/// Cache whose store is unreachable
pub struct DownCache;

#[async_trait]
impl Cache for DownCache {
    async fn get(&self, _key: &str) -> Result<Option<Payload>, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn set(&self, _key: &str, _payload: &Payload, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }
}

/// Cache that never answers within the resolver's timeout
pub struct StalledCache;

#[async_trait]
impl Cache for StalledCache {
    async fn get(&self, _key: &str) -> Result<Option<Payload>, CacheError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(None)
    }

    async fn set(&self, _key: &str, _payload: &Payload, _ttl: Duration) -> Result<(), CacheError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

pub fn resolver(cache: Arc<dyn Cache>, source: Arc<StubSource>) -> CacheAsideResolver {
    CacheAsideResolver::new(cache, source, CACHE_TIMEOUT)
}

pub struct Harness {
    pub service: LocationService,
    pub store: Arc<MemoryLocationStore>,
    pub cache: Arc<CountingCache>,
    pub source: Arc<StubSource>,
}

impl Harness {
    pub fn new(source: StubSource) -> Self {
        let store = Arc::new(MemoryLocationStore::new());
        let cache = Arc::new(CountingCache::new());
        let source = Arc::new(source);

        let service = LocationService::new(
            store.clone() as Arc<dyn LocationStore>,
            resolver(cache.clone(), source.clone()),
        );

        Self {
            service,
            store,
            cache,
            source,
        }
    }
}
