use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use url::Url;

use super::{Payload, Rejection, SourceError, WeatherSource};
use crate::domain::Coordinates;

const WEATHER_PATH: &str = "data/2.5/weather";
const DEFAULT_REJECTION: &str = "Invalid location or coordinates";

#[derive(Debug, Clone)]
pub struct OpenWeatherSettings {
    pub base_url: Url,
    pub api_key: String,
    pub units: String,
    pub timeout: Duration,
}

/// Client for the OpenWeatherMap current-weather endpoint
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    units: String,
}

impl OpenWeatherClient {
    pub fn new(settings: &OpenWeatherSettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("Failed to build weather http client")?;

        let endpoint = settings
            .base_url
            .join(WEATHER_PATH)
            .context("Failed to build weather endpoint url")?;

        Ok(Self {
            client,
            endpoint,
            api_key: settings.api_key.clone(),
            units: settings.units.clone(),
        })
    }

    async fn fetch(&self, query: &[(&str, String)]) -> Result<Payload, SourceError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(query)
            .query(&[("units", &self.units), ("appid", &self.api_key)])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "weather request failed");
                SourceError::Unavailable(e.to_string())
            })?;

        let status = response.status();

        if status.is_server_error() {
            tracing::warn!(status = %status, "weather service returned a server error");
            return Err(SourceError::Unavailable(format!(
                "upstream responded with {status}"
            )));
        }

        if let Some(fault) = upstream_fault(status.as_u16()) {
            return Err(fault);
        }

        // Rejection bodies are JSON too, fall back to the status line if not
        let body: Option<Value> = response.json().await.ok();

        if status.is_client_error() {
            return Err(SourceError::Rejected(rejection(status, body.as_ref())));
        }

        let Some(body) = body else {
            return Err(SourceError::Unavailable(
                "upstream returned an unreadable body".to_string(),
            ));
        };

        match body.get("cod").and_then(code_of) {
            Some(code) if code != StatusCode::OK.as_u16() => {
                let rejected = || SourceError::Rejected(rejection(status, Some(&body)));
                Err(upstream_fault(code).unwrap_or_else(rejected))
            }
            _ => Ok(body),
        }
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    #[tracing::instrument(name = "weather::fetch_by_coordinates", skip(self))]
    async fn fetch_by_coordinates(&self, coords: Coordinates) -> Result<Payload, SourceError> {
        self.fetch(&[
            ("lat", coords.latitude.to_string()),
            ("lon", coords.longitude.to_string()),
        ])
        .await
    }

    #[tracing::instrument(name = "weather::fetch_by_name", skip(self))]
    async fn fetch_by_name(&self, name: &str) -> Result<Payload, SourceError> {
        self.fetch(&[("q", name.to_string())]).await
    }
}

/// Failures that say nothing about the requested location: throttling and
/// refused credentials.
fn upstream_fault(code: u16) -> Option<SourceError> {
    match StatusCode::from_u16(code).ok()? {
        StatusCode::TOO_MANY_REQUESTS => {
            tracing::warn!("weather service is throttling requests");
            Some(SourceError::Unavailable(
                "upstream request quota exceeded".to_string(),
            ))
        }
        status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
            tracing::error!(status = %status, "weather service refused the configured api key");
            Some(SourceError::Unavailable(format!(
                "upstream refused credentials with {status}"
            )))
        }
        _ => None,
    }
}

/// OpenWeatherMap reports `cod` as a number on success and a string on errors
fn code_of(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|c| u16::try_from(c).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn rejection(status: StatusCode, body: Option<&Value>) -> Rejection {
    let code = body
        .and_then(|b| b.get("cod"))
        .and_then(code_of)
        .unwrap_or(status.as_u16());

    let message = body
        .and_then(|b| b.get("message"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_REJECTION);

    Rejection::new(code, message)
}
