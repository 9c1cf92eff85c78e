use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    api::error::ApiError,
    app::AppState,
    domain::{Location, LocationFields, LocationId, LocationName, LocationPatch},
};

#[derive(Serialize, Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Serialize, Deserialize, Default)]
pub struct UpdateLocationRequest {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

pub async fn list_locations(State(app): State<AppState>) -> Result<Json<Vec<Location>>, ApiError> {
    let locations = app.locations.list().await?;
    Ok(Json(locations))
}

pub async fn create_location(
    State(app): State<AppState>,
    Json(CreateLocationRequest {
        name,
        latitude,
        longitude,
    }): Json<CreateLocationRequest>,
) -> Result<Response, ApiError> {
    let name: LocationName = name.try_into()?;

    let location = app
        .locations
        .create(LocationFields {
            name,
            latitude,
            longitude,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(location)).into_response())
}

pub async fn get_location(
    State(app): State<AppState>,
    Path(id): Path<LocationId>,
) -> Result<Json<Location>, ApiError> {
    let location = app.locations.get(id).await?;
    Ok(Json(location))
}

pub async fn update_location(
    State(app): State<AppState>,
    Path(id): Path<LocationId>,
    Json(UpdateLocationRequest {
        name,
        latitude,
        longitude,
    }): Json<UpdateLocationRequest>,
) -> Result<Json<Location>, ApiError> {
    let name = name.map(LocationName::try_from).transpose()?;

    let location = app
        .locations
        .update(
            id,
            LocationPatch {
                name,
                latitude,
                longitude,
            },
        )
        .await?;

    Ok(Json(location))
}

pub async fn delete_location(
    State(app): State<AppState>,
    Path(id): Path<LocationId>,
) -> Result<StatusCode, ApiError> {
    app.locations.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
