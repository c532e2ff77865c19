// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::services::strava::StravaError;
use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Strava authorization required")]
    NotAuthorized,

    #[error("Strava API error: {0}")]
    Upstream(#[from] StravaError),

    #[error("Credential storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Configuration(msg) => {
                tracing::error!(error = %msg, "Server misconfigured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration_error",
                    Some(msg.clone()),
                )
            }
            AppError::NotAuthorized => (
                StatusCode::UNAUTHORIZED,
                "not_authorized",
                Some("Complete Strava authorization via /api/strava/auth-url".to_string()),
            ),
            AppError::Upstream(err) => {
                tracing::warn!(error = %err, "Strava API call failed");
                (StatusCode::BAD_GATEWAY, "strava_error", Some(err.to_string()))
            }
            AppError::Storage(err) => {
                tracing::error!(error = %err, "Credential storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", None)
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
