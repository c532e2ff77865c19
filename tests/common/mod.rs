// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use run_dashboard::config::{Config, StravaSettings};
use run_dashboard::models::Credential;
use run_dashboard::routes::create_router;
use run_dashboard::services::{StravaClient, TokenManager};
use run_dashboard::store::{CredentialStore, FileCredentialStore, LocalCipher, StoreError};
use run_dashboard::AppState;
use std::path::Path;
use std::sync::{Arc, Mutex};
use wiremock::MockServer;

/// Deterministic cipher for tests.
#[allow(dead_code)]
pub fn test_cipher() -> LocalCipher {
    LocalCipher::derive(&[42u8; 32], "test-machine", "test-user").expect("derive test key")
}

/// File store inside `dir` using the test cipher.
#[allow(dead_code)]
pub fn test_store(dir: &Path) -> FileCredentialStore {
    FileCredentialStore::new(dir.join("strava_tokens.json"), test_cipher())
}

/// Strava client pointed at a mock server.
#[allow(dead_code)]
pub fn client_for(server: &MockServer) -> StravaClient {
    StravaClient::with_base_urls(
        &format!("{}/oauth", server.uri()),
        &format!("{}/api/v3", server.uri()),
    )
}

#[allow(dead_code)]
pub fn test_settings() -> StravaSettings {
    Config::default().strava
}

#[allow(dead_code)]
pub fn credential_expiring_in(duration: Duration) -> Credential {
    Credential {
        access_token: "stored_access".to_string(),
        expires_at: Utc::now() + duration,
        refresh_token: "stored_refresh".to_string(),
    }
}

/// JSON body of a Strava token endpoint response.
#[allow(dead_code)]
pub fn token_response(access: &str, refresh: &str, expires_at: DateTime<Utc>) -> serde_json::Value {
    serde_json::json!({
        "token_type": "Bearer",
        "access_token": access,
        "expires_at": expires_at.timestamp(),
        "expires_in": (expires_at - Utc::now()).num_seconds(),
        "refresh_token": refresh,
        "athlete": { "id": 12345, "firstname": "Test", "lastname": "Runner" }
    })
}

/// In-memory store whose writes can be made to fail.
#[allow(dead_code)]
#[derive(Default)]
pub struct MemoryStore {
    credential: Mutex<Option<Credential>>,
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn with(credential: Credential) -> Self {
        Self {
            credential: Mutex::new(Some(credential)),
            fail_writes: false,
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn read(&self) -> Option<Credential> {
        self.credential.lock().unwrap().clone()
    }

    async fn write(&self, credential: &Credential) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        *self.credential.lock().unwrap() = Some(credential.clone());
        Ok(())
    }
}

/// Create a test app talking to `server`, backed by `store`.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app(
    server: &MockServer,
    config: Config,
    store: Arc<dyn CredentialStore>,
) -> (axum::Router, Arc<AppState>) {
    let strava = client_for(server);
    let tokens = TokenManager::new(config.strava.clone(), strava.clone(), store);

    let state = Arc::new(AppState {
        config,
        tokens,
        strava,
    });

    (create_router(state.clone()), state)
}
