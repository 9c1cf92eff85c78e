use std::borrow::Cow;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{domain::NameParseError, services::LocationError};

pub struct ApiError {
    status_code: StatusCode,
    reason: Cow<'static, str>,
}

#[derive(Deserialize, Serialize)]
pub struct ApiErrorBody(pub String);

impl ApiError {
    pub fn public(status_code: StatusCode, reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            status_code,
            reason: reason.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::public(StatusCode::NOT_FOUND, "Location not found")
    }

    pub fn internal() -> Self {
        Self::public(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    pub fn too_many_requests() -> Self {
        Self::public(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests, please try again later",
        )
    }
}

impl From<LocationError> for ApiError {
    fn from(error: LocationError) -> Self {
        match error {
            LocationError::NotFound => Self::not_found(),
            LocationError::AlreadyExists => Self::public(
                StatusCode::CONFLICT,
                "Location already present, update the location instead",
            ),
            LocationError::Invalid(rejection) => {
                // Mirror the upstream code when it is a client error. An unknown
                // city must not read as a missing record, so 404 becomes 400.
                let status = StatusCode::from_u16(rejection.code)
                    .ok()
                    .filter(StatusCode::is_client_error)
                    .filter(|status| *status != StatusCode::NOT_FOUND)
                    .unwrap_or(StatusCode::BAD_REQUEST);
                Self::public(status, rejection.message)
            }
            LocationError::Unavailable(e) => {
                tracing::error!(error = %e, "weather service unavailable");
                Self::public(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Weather service unavailable, please retry later",
                )
            }
            LocationError::Store(e) => {
                tracing::error!(error = %e, "store error");
                Self::internal()
            }
        }
    }
}

impl From<NameParseError> for ApiError {
    fn from(error: NameParseError) -> Self {
        match error {
            NameParseError::Empty => {
                Self::public(StatusCode::BAD_REQUEST, "Location name is empty")
            }
            NameParseError::TooLong => {
                Self::public(StatusCode::BAD_REQUEST, "Location name is too long")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code, Json(ApiErrorBody(self.reason.into_owned()))).into_response()
    }
}
