use std::sync::{
    Arc,
    atomic::{AtomicI64, AtomicU64, Ordering},
};

use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};

use super::{LocationStore, RequestLogStore, StoreError};
use crate::domain::{Location, LocationFields, LocationId, Lookup, RequestLog};

/// Process-local store, used when no database is configured
#[derive(Clone, Default)]
pub struct MemoryLocationStore {
    records: Arc<DashMap<LocationId, Location>>,
    /// Owner of each lookup key; plays the part of the unique indexes in postgres
    owners: Arc<DashMap<String, LocationId>>,
    next_id: Arc<AtomicI64>,
}

impl MemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn release(&self, key: &str, id: LocationId) {
        self.owners.remove_if(key, |_, owner| *owner == id);
    }
}

fn build(id: LocationId, fields: &LocationFields) -> Location {
    Location {
        id,
        name: fields.name.as_str().to_string(),
        latitude: fields.latitude,
        longitude: fields.longitude,
    }
}

#[async_trait]
impl LocationStore for MemoryLocationStore {
    async fn create(&self, fields: &LocationFields) -> Result<Location, StoreError> {
        // Claiming the key and inserting happen under the key's shard lock
        match self.owners.entry(fields.lookup().cache_key()) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                let location = build(id, fields);
                self.records.insert(id, location.clone());
                slot.insert(id);
                Ok(location)
            }
        }
    }

    async fn get(&self, id: LocationId) -> Result<Option<Location>, StoreError> {
        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list(&self) -> Result<Vec<Location>, StoreError> {
        let mut locations: Vec<Location> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        locations.sort_by_key(|location| location.id);
        Ok(locations)
    }

    async fn find(&self, lookup: &Lookup) -> Result<Option<Location>, StoreError> {
        let Some(id) = self.owners.get(&lookup.cache_key()).map(|owner| *owner) else {
            return Ok(None);
        };
        self.get(id).await
    }

    async fn update(
        &self,
        id: LocationId,
        fields: &LocationFields,
    ) -> Result<Option<Location>, StoreError> {
        let Some(current) = self.get(id).await? else {
            return Ok(None);
        };
        let old_key = current.lookup().cache_key();
        let new_key = fields.lookup().cache_key();

        if new_key != old_key {
            match self.owners.entry(new_key.clone()) {
                Entry::Occupied(_) => return Err(StoreError::Conflict),
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
        }

        let updated = self.records.get_mut(&id).map(|mut entry| {
            *entry = build(id, fields);
            entry.value().clone()
        });

        match updated {
            Some(_) if new_key != old_key => self.release(&old_key, id),
            Some(_) => {}
            // removed while we were claiming the new key
            None => self.release(&new_key, id),
        }

        Ok(updated)
    }

    async fn delete(&self, id: LocationId) -> Result<bool, StoreError> {
        match self.records.remove(&id) {
            Some((_, location)) => {
                self.release(&location.lookup().cache_key(), id);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Keeps access log lines in process memory
#[derive(Clone, Default)]
pub struct MemoryRequestLogStore {
    entries: Arc<DashMap<u64, RequestLog>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryRequestLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded lines, oldest first
    pub fn entries(&self) -> Vec<RequestLog> {
        let mut entries: Vec<(u64, RequestLog)> = self
            .entries
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries.into_iter().map(|(_, entry)| entry).collect()
    }
}

#[async_trait]
impl RequestLogStore for MemoryRequestLogStore {
    async fn record(&self, entry: &RequestLog) -> Result<(), StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(id, entry.clone());
        Ok(())
    }
}
