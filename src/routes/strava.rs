// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava authorization and activity routes.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::models::RunProjection;
use crate::services::activity::recent_runs;
use crate::AppState;

/// Activities requested when the client does not say.
pub const DEFAULT_PER_PAGE: u32 = 10;
/// Strava's page size cap.
pub const MAX_PER_PAGE: u32 = 200;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/strava/auth-url", get(auth_url))
        .route("/api/strava/oauth/callback", get(oauth_callback))
        .route("/api/strava/activities", get(get_activities))
}

// ─── Authorization ───────────────────────────────────────────

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthUrlResponse {
    pub url: String,
}

/// Get the Strava authorization URL.
async fn auth_url(State(state): State<Arc<AppState>>) -> Result<Json<AuthUrlResponse>> {
    let url = state.tokens.build_authorize_url()?;
    Ok(Json(AuthUrlResponse { url }))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange the code for tokens and return to the frontend.
async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect> {
    let frontend_url = &state.config.frontend_url;

    // The user declined (or Strava failed) before issuing a code.
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Strava");
        let redirect = format!("{}/login?error={}", frontend_url, urlencoding::encode(&error));
        return Ok(Redirect::temporary(&redirect));
    }

    let code = params
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Authorization code is required".to_string()))?;

    state.tokens.complete_authorization(code.trim()).await?;

    Ok(Redirect::temporary(&format!(
        "{}/login?connected=1",
        frontend_url
    )))
}

// ─── Activities ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ActivitiesQuery {
    #[serde(default, rename = "perPage")]
    per_page: Option<u32>,
}

/// Get the latest runs.
async fn get_activities(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<ActivitiesQuery>, QueryRejection>,
) -> Result<Json<Vec<RunProjection>>> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE);
    if !(1..=MAX_PER_PAGE).contains(&per_page) {
        return Err(AppError::BadRequest(format!(
            "perPage must be between 1 and {}",
            MAX_PER_PAGE
        )));
    }

    let runs = recent_runs(&state.tokens, &state.strava, per_page).await?;
    Ok(Json(runs))
}
