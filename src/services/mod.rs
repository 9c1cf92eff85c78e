use thiserror::Error;

use crate::{resolver::Unavailable, store::StoreError, weather::Rejection};

mod locations;

pub use locations::{LocationService, WeatherReport};

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("location not found")]
    NotFound,
    #[error("location already exists")]
    AlreadyExists,
    #[error("invalid location ({}): {}", .0.code, .0.message)]
    Invalid(Rejection),
    #[error(transparent)]
    Unavailable(#[from] Unavailable),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for LocationError {
    fn from(error: StoreError) -> Self {
        match error {
            // lost a race with a concurrent write for the same target
            StoreError::Conflict => LocationError::AlreadyExists,
            error => LocationError::Store(error),
        }
    }
}
