use std::sync::Arc;

use crate::{
    domain::{Location, LocationFields, LocationId, LocationPatch, Lookup},
    resolver::{CacheAsideResolver, Resolved, Validation},
    services::LocationError,
    store::LocationStore,
    weather::Payload,
};

/// Weather payload for a stored location
#[derive(Debug, Clone)]
pub struct WeatherReport {
    pub payload: Payload,
    pub cached: bool,
}

/// Record CRUD with weather validation and cache invalidation
pub struct LocationService {
    store: Arc<dyn LocationStore>,
    resolver: CacheAsideResolver,
}

impl LocationService {
    pub fn new(store: Arc<dyn LocationStore>, resolver: CacheAsideResolver) -> Self {
        Self { store, resolver }
    }

    pub fn resolver(&self) -> &CacheAsideResolver {
        &self.resolver
    }

    #[tracing::instrument(name = "services::list_locations", skip(self))]
    pub async fn list(&self) -> Result<Vec<Location>, LocationError> {
        Ok(self.store.list().await?)
    }

    #[tracing::instrument(name = "services::get_location", skip(self))]
    pub async fn get(&self, id: LocationId) -> Result<Location, LocationError> {
        self.store.get(id).await?.ok_or(LocationError::NotFound)
    }

    /// Validate against the weather service and store a new record.
    ///
    /// Duplicates are detected in the store, not through the cache: a cached
    /// payload only means the target was validated before.
    #[tracing::instrument(name = "services::create_location", skip(self))]
    pub async fn create(&self, fields: LocationFields) -> Result<Location, LocationError> {
        let lookup = fields.lookup();

        if let Some(existing) = self.store.find(&lookup).await? {
            tracing::debug!(id = existing.id, "location already present");
            return Err(LocationError::AlreadyExists);
        }

        let resolved = self.validate(&lookup).await?;
        tracing::debug!(cached = resolved.is_cached(), "location validated");

        let location = self.store.create(&fields).await?;
        tracing::info!(id = location.id, "location created");

        Ok(location)
    }

    /// Merge `patch` onto the record, drop the cache entry of the old target
    /// and validate the new one. Validation repopulates the cache under the
    /// new key.
    #[tracing::instrument(name = "services::update_location", skip(self))]
    pub async fn update(
        &self,
        id: LocationId,
        patch: LocationPatch,
    ) -> Result<Location, LocationError> {
        let current = self.get(id).await?;

        self.resolver.invalidate(&current.lookup()).await;

        let fields = patch.apply(&current);
        let lookup = fields.lookup();

        let owner = self.store.find(&lookup).await?;
        if let Some(other) = owner.filter(|other| other.id != id) {
            tracing::debug!(id, other = other.id, "target owned by another location");
            return Err(LocationError::AlreadyExists);
        }

        self.validate(&lookup).await?;

        let updated = self
            .store
            .update(id, &fields)
            .await?
            .ok_or(LocationError::NotFound)?;
        tracing::info!(id, "location updated");

        Ok(updated)
    }

    #[tracing::instrument(name = "services::delete_location", skip(self))]
    pub async fn delete(&self, id: LocationId) -> Result<(), LocationError> {
        let current = self.get(id).await?;

        self.resolver.invalidate(&current.lookup()).await;

        if !self.store.delete(id).await? {
            return Err(LocationError::NotFound);
        }
        tracing::info!(id, "location deleted");

        Ok(())
    }

    #[tracing::instrument(name = "services::weather_lookup", skip(self))]
    pub async fn weather_lookup(&self, id: LocationId) -> Result<WeatherReport, LocationError> {
        let location = self.get(id).await?;
        let resolved = self.validate(&location.lookup()).await?;

        Ok(WeatherReport {
            cached: resolved.is_cached(),
            payload: resolved.payload,
        })
    }

    async fn validate(&self, lookup: &Lookup) -> Result<Resolved, LocationError> {
        match self.resolver.resolve(lookup).await? {
            Validation::Valid(resolved) => Ok(resolved),
            Validation::Invalid(rejection) => {
                tracing::debug!(code = rejection.code, "weather service rejected location");
                Err(LocationError::Invalid(rejection))
            }
        }
    }
}
