use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool, postgres::PgPoolOptions};

use super::{LocationStore, RequestLogStore, StoreError};
use crate::domain::{Location, LocationFields, LocationId, Lookup, RequestLog};

#[derive(FromRow)]
struct LocationRow {
    id: i64,
    name: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            id: row.id,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
        }
    }
}

/// Unique index violations mean the lookup target is taken
fn conflict_or_db(error: sqlx::Error) -> StoreError {
    match &error {
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => StoreError::Conflict,
        _ => StoreError::DatabaseError(error),
    }
}

pub async fn connect_to_db(database_url: &str) -> Result<PgPool> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    // Run SQL migrations
    sqlx::migrate!()
        .run(&pool)
        .await
        .context("SQL migrations failed")?;

    Ok(pool)
}

#[derive(Clone)]
pub struct PgLocationStore {
    pool: PgPool,
}

impl PgLocationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocationStore for PgLocationStore {
    #[tracing::instrument(name = "store::create_location", skip(self))]
    async fn create(&self, fields: &LocationFields) -> Result<Location, StoreError> {
        let row = sqlx::query_as::<_, LocationRow>(
            r#"
            INSERT INTO locations (name, latitude, longitude)
            VALUES ($1, $2, $3)
            RETURNING id, name, latitude, longitude
            "#,
        )
        .bind(fields.name.as_str())
        .bind(fields.latitude)
        .bind(fields.longitude)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_or_db)?;

        Ok(row.into())
    }

    #[tracing::instrument(name = "store::get_location", skip(self))]
    async fn get(&self, id: LocationId) -> Result<Option<Location>, StoreError> {
        let row_opt = sqlx::query_as::<_, LocationRow>(
            r#"SELECT id, name, latitude, longitude FROM locations WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row_opt.map(Location::from))
    }

    #[tracing::instrument(name = "store::list_locations", skip(self))]
    async fn list(&self) -> Result<Vec<Location>, StoreError> {
        let rows = sqlx::query_as::<_, LocationRow>(
            r#"SELECT id, name, latitude, longitude FROM locations ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Location::from).collect())
    }

    #[tracing::instrument(name = "store::find_location", skip(self))]
    async fn find(&self, lookup: &Lookup) -> Result<Option<Location>, StoreError> {
        let query = match lookup {
            Lookup::Coordinates(coords) => sqlx::query_as::<_, LocationRow>(
                r#"
                SELECT id, name, latitude, longitude
                FROM locations
                WHERE latitude = $1 AND longitude = $2
                ORDER BY id
                LIMIT 1
                "#,
            )
            .bind(coords.latitude)
            .bind(coords.longitude),
            Lookup::Name(name) => sqlx::query_as::<_, LocationRow>(
                r#"
                SELECT id, name, latitude, longitude
                FROM locations
                WHERE (latitude IS NULL OR longitude IS NULL)
                  AND lower(name) = lower($1)
                ORDER BY id
                LIMIT 1
                "#,
            )
            .bind(name.as_str()),
        };

        let row_opt = query.fetch_optional(&self.pool).await?;

        Ok(row_opt.map(Location::from))
    }

    #[tracing::instrument(name = "store::update_location", skip(self))]
    async fn update(
        &self,
        id: LocationId,
        fields: &LocationFields,
    ) -> Result<Option<Location>, StoreError> {
        let row_opt = sqlx::query_as::<_, LocationRow>(
            r#"
            UPDATE locations
            SET name = $1, latitude = $2, longitude = $3
            WHERE id = $4
            RETURNING id, name, latitude, longitude
            "#,
        )
        .bind(fields.name.as_str())
        .bind(fields.latitude)
        .bind(fields.longitude)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conflict_or_db)?;

        Ok(row_opt.map(Location::from))
    }

    #[tracing::instrument(name = "store::delete_location", skip(self))]
    async fn delete(&self, id: LocationId) -> Result<bool, StoreError> {
        let result = sqlx::query(r#"DELETE FROM locations WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PgRequestLogStore {
    pool: PgPool,
}

impl PgRequestLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestLogStore for PgRequestLogStore {
    async fn record(&self, entry: &RequestLog) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO request_logs (method, path, status, latency_ms)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry.method.as_str())
        .bind(entry.path.as_str())
        .bind(i32::from(entry.status))
        .bind(entry.latency.as_secs_f64() * 1000.0)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
