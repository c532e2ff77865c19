// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava token lifecycle.
//!
//! [`TokenManager`] completes the OAuth authorization-code handshake and
//! hands out access tokens that are guaranteed to outlive the refresh
//! margin, refreshing through Strava when the stored one does not.

use crate::config::StravaSettings;
use crate::error::AppError;
use crate::models::Credential;
use crate::services::strava::{StravaClient, StravaError, TokenEnvelope};
use crate::store::CredentialStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Scopes requested from Strava: profile read plus all activities.
pub const AUTHORIZE_SCOPES: &str = "read,activity:read_all";

/// Validity of the stored credential at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// No usable credential; the authorization handshake is required.
    Unauthorized,
    /// Access token outlives the refresh margin.
    Valid(Credential),
    /// Access token expires within the margin (or already has).
    Expiring(Credential),
}

impl TokenStatus {
    pub fn evaluate(credential: Option<Credential>, now: DateTime<Utc>) -> Self {
        match credential {
            None => TokenStatus::Unauthorized,
            Some(c) if c.is_usable_at(now) => TokenStatus::Valid(c),
            Some(c) => TokenStatus::Expiring(c),
        }
    }
}

/// Orchestrates the credential store and Strava's token endpoint.
pub struct TokenManager {
    settings: StravaSettings,
    client: StravaClient,
    store: Arc<dyn CredentialStore>,
    /// Serializes credential replacement (refresh and authorization) within
    /// this process.
    refresh_lock: Mutex<()>,
}

impl TokenManager {
    pub fn new(
        settings: StravaSettings,
        client: StravaClient,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            settings,
            client,
            store,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Build the Strava authorization URL the user must visit.
    pub fn build_authorize_url(&self) -> Result<String, AppError> {
        let client_id = required(&self.settings.client_id, "client id")?;
        let redirect_uri = required(&self.settings.redirect_uri, "redirect URI")?;

        Ok(format!(
            "{}/authorize?\
             client_id={}&\
             response_type=code&\
             redirect_uri={}&\
             approval_prompt=auto&\
             scope={}",
            self.client.oauth_base_url(),
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            AUTHORIZE_SCOPES
        ))
    }

    /// Exchange the authorization code Strava redirected back with and store
    /// the resulting credential.
    pub async fn complete_authorization(&self, code: &str) -> Result<(), AppError> {
        let (client_id, client_secret) = self.client_credentials()?;

        // An in-flight refresh must not overwrite the new credential.
        let _guard = self.refresh_lock.lock().await;

        tracing::info!("Exchanging authorization code for tokens");
        let envelope = self
            .client
            .exchange_code(code, client_id, client_secret)
            .await?;
        let credential = credential_from_envelope(envelope)?;

        self.store.write(&credential).await?;

        tracing::info!(
            expires_at = %credential.expires_at,
            "Strava authorization complete, credential stored"
        );
        Ok(())
    }

    /// Current validity of the stored credential.
    pub async fn status(&self) -> TokenStatus {
        TokenStatus::evaluate(self.store.read().await, Utc::now())
    }

    /// Get an access token that remains valid beyond the refresh margin.
    ///
    /// Refreshes (and persists the new credential) when the stored token is
    /// expiring. Concurrent callers share a single refresh.
    pub async fn get_valid_access_token(&self) -> Result<String, AppError> {
        match self.status().await {
            TokenStatus::Unauthorized => return Err(AppError::NotAuthorized),
            TokenStatus::Valid(credential) => return Ok(credential.access_token),
            TokenStatus::Expiring(_) => {}
        }

        let _guard = self.refresh_lock.lock().await;

        // Another task may have refreshed while we waited.
        let credential = match self.status().await {
            TokenStatus::Unauthorized => return Err(AppError::NotAuthorized),
            TokenStatus::Valid(credential) => {
                tracing::debug!("Token refreshed by another request");
                return Ok(credential.access_token);
            }
            TokenStatus::Expiring(credential) => credential,
        };

        let (client_id, client_secret) = self.client_credentials()?;

        tracing::info!(
            expires_at = %credential.expires_at,
            "Access token expiring, refreshing"
        );
        let envelope = self
            .client
            .refresh(&credential.refresh_token, client_id, client_secret)
            .await?;
        let refreshed = credential_from_envelope(envelope)?;

        self.store.write(&refreshed).await?;

        if !refreshed.is_usable_at(Utc::now()) {
            tracing::warn!(
                expires_at = %refreshed.expires_at,
                "Strava issued a token inside the refresh margin"
            );
        }

        tracing::info!(expires_at = %refreshed.expires_at, "Token refreshed and stored");
        Ok(refreshed.access_token)
    }

    fn client_credentials(&self) -> Result<(&str, &str), AppError> {
        let client_secret = required(&self.settings.client_secret, "client secret")?;
        let client_id = required(&self.settings.client_id, "client id")?;
        Ok((client_id, client_secret))
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Configuration(format!("Strava {} is not configured", name)))
}

/// Convert a token endpoint response into a stored credential.
pub fn credential_from_envelope(envelope: TokenEnvelope) -> Result<Credential, StravaError> {
    let expires_at = DateTime::from_timestamp(envelope.expires_at, 0)
        .ok_or(StravaError::InvalidTokenResponse("expires_at out of range"))?;

    Ok(Credential {
        access_token: envelope.access_token,
        expires_at,
        refresh_token: envelope.refresh_token,
    })
}
