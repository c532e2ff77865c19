// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client.
//!
//! Handles:
//! - Authorization code exchange
//! - Token refresh
//! - Listing the athlete's recent activities
//!
//! Every call is a single request; retries are left to the caller.

use crate::models::Activity;
use serde::Deserialize;

pub const DEFAULT_OAUTH_BASE_URL: &str = "https://www.strava.com/oauth";
pub const DEFAULT_API_BASE_URL: &str = "https://www.strava.com/api/v3";

/// Errors from a Strava API call.
#[derive(Debug, thiserror::Error)]
pub enum StravaError {
    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Strava rejected the credentials")]
    Unauthorized,

    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Unexpected response body: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(&'static str),
}

/// Token endpoint response for both grant types.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenEnvelope {
    pub access_token: String,
    /// Expiry as seconds since the Unix epoch
    pub expires_at: i64,
    pub refresh_token: String,
}

/// Strava API client.
#[derive(Debug, Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    oauth_base_url: String,
    api_base_url: String,
}

impl Default for StravaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl StravaClient {
    /// Create a client for the public Strava endpoints.
    pub fn new() -> Self {
        Self::with_base_urls(DEFAULT_OAUTH_BASE_URL, DEFAULT_API_BASE_URL)
    }

    /// Create a client against alternate endpoints (proxies, test servers).
    pub fn with_base_urls(oauth_base_url: &str, api_base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            oauth_base_url: oauth_base_url.trim_end_matches('/').to_string(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn oauth_base_url(&self) -> &str {
        &self.oauth_base_url
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        code: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenEnvelope, StravaError> {
        self.request_token(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("grant_type", "authorization_code"),
        ])
        .await
    }

    /// Mint a new access token from a refresh token.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenEnvelope, StravaError> {
        self.request_token(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .await
    }

    /// List the authenticated athlete's most recent activities.
    pub async fn list_activities(
        &self,
        access_token: &str,
        per_page: u32,
    ) -> Result<Vec<Activity>, StravaError> {
        let url = format!("{}/athlete/activities", self.api_base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("per_page", per_page.to_string())])
            .send()
            .await
            .map_err(StravaError::Request)?;

        check_response_json(response).await
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenEnvelope, StravaError> {
        let url = format!("{}/token", self.oauth_base_url);

        let response = self
            .http
            .post(&url)
            .form(form)
            .send()
            .await
            .map_err(StravaError::Request)?;

        let envelope: TokenEnvelope = check_response_json(response).await?;

        if envelope.access_token.is_empty() {
            return Err(StravaError::InvalidTokenResponse("empty access_token"));
        }
        if envelope.refresh_token.is_empty() {
            return Err(StravaError::InvalidTokenResponse("empty refresh_token"));
        }

        Ok(envelope)
    }
}

/// Check response status and parse the JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, StravaError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Strava rate limit hit (429)");
            return Err(StravaError::RateLimited);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(StravaError::Unauthorized);
        }

        return Err(StravaError::Status { status, body });
    }

    response.json().await.map_err(StravaError::Decode)
}
