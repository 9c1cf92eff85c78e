use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{api::error::ApiError, app::AppState, domain::LocationId};

/// Tells clients whether the payload was served from the cache
pub const CACHE_STATUS_HEADER: &str = "x-cache";

pub async fn weather(
    State(app): State<AppState>,
    Path(id): Path<LocationId>,
) -> Result<Response, ApiError> {
    let report = app.locations.weather_lookup(id).await?;

    let cache_status = if report.cached {
        HeaderValue::from_static("hit")
    } else {
        HeaderValue::from_static("miss")
    };

    Ok((
        StatusCode::OK,
        [(CACHE_STATUS_HEADER, cache_status)],
        Json(report.payload),
    )
        .into_response())
}
