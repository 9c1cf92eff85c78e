use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::Coordinates;

mod openweather;

pub use openweather::{OpenWeatherClient, OpenWeatherSettings};

/// Weather service response body, kept opaque and handed back to callers as-is
pub type Payload = serde_json::Value;

/// The weather service refused the input, e.g. malformed coordinates or an unknown city
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub code: u16,
    pub message: String,
}

impl Rejection {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("weather service rejected the request ({}): {}", .0.code, .0.message)]
    Rejected(Rejection),
    /// Timeouts, DNS, connection and 5xx failures; says nothing about the input
    #[error("weather service unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_by_coordinates(&self, coords: Coordinates) -> Result<Payload, SourceError>;

    async fn fetch_by_name(&self, name: &str) -> Result<Payload, SourceError>;
}
