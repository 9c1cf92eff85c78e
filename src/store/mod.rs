use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Location, LocationFields, LocationId, Lookup, RequestLog};

mod memory;
mod postgres;

pub use memory::{MemoryLocationStore, MemoryRequestLogStore};
pub use postgres::{PgLocationStore, PgRequestLogStore, connect_to_db};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Another record already targets the same coordinates or name
    #[error("location target already taken")]
    Conflict,
    #[error("database error {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Persistent collection of location records
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Fails with `StoreError::Conflict` if another record has the same lookup target
    async fn create(&self, fields: &LocationFields) -> Result<Location, StoreError>;

    async fn get(&self, id: LocationId) -> Result<Option<Location>, StoreError>;

    async fn list(&self) -> Result<Vec<Location>, StoreError>;

    /// Finds the record that `lookup` would resolve to, used for duplicate detection
    async fn find(&self, lookup: &Lookup) -> Result<Option<Location>, StoreError>;

    /// Returns `Ok(None)` if the record does not exist, `StoreError::Conflict`
    /// if the new target belongs to another record
    async fn update(
        &self,
        id: LocationId,
        fields: &LocationFields,
    ) -> Result<Option<Location>, StoreError>;

    /// Returns `Ok(false)` if the record does not exist
    async fn delete(&self, id: LocationId) -> Result<bool, StoreError>;
}

/// Append-only sink for access log lines
#[async_trait]
pub trait RequestLogStore: Send + Sync {
    async fn record(&self, entry: &RequestLog) -> Result<(), StoreError>;
}
