// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Strava OAuth settings are optional at startup. The operation that needs a
//! missing setting fails with a configuration error instead.

use crate::services::strava::{DEFAULT_API_BASE_URL, DEFAULT_OAUTH_BASE_URL};
use std::env;
use std::path::PathBuf;

/// Strava OAuth application settings.
#[derive(Debug, Clone, Default)]
pub struct StravaSettings {
    /// Strava OAuth client ID (public)
    pub client_id: Option<String>,
    /// Strava OAuth client secret
    pub client_secret: Option<String>,
    /// Callback URL registered with Strava
    pub redirect_uri: Option<String>,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub strava: StravaSettings,
    /// Frontend URL for post-authorization redirects
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Credential file location
    pub token_store_path: PathBuf,
    /// Per-user key file protecting the stored refresh token
    pub token_key_path: PathBuf,
    pub strava_oauth_base_url: String,
    pub strava_api_base_url: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            strava: StravaSettings {
                client_id: Some("test_client_id".to_string()),
                client_secret: Some("test_secret".to_string()),
                redirect_uri: Some("http://localhost:8080/api/strava/oauth/callback".to_string()),
            },
            frontend_url: "http://localhost:4200".to_string(),
            port: 8080,
            token_store_path: PathBuf::from("AppData/strava_tokens.json"),
            token_key_path: PathBuf::from("AppData/token.key"),
            strava_oauth_base_url: DEFAULT_OAUTH_BASE_URL.to_string(),
            strava_api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let port = match env::var("PORT") {
            Ok(p) => p
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", p.clone()))?,
            Err(_) => 8080,
        };

        Ok(Self {
            strava: StravaSettings {
                client_id: optional_var("STRAVA_CLIENT_ID"),
                client_secret: optional_var("STRAVA_CLIENT_SECRET"),
                redirect_uri: optional_var("STRAVA_REDIRECT_URI"),
            },
            frontend_url: optional_var("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:4200".to_string())
                .trim_end_matches('/')
                .to_string(),
            port,
            token_store_path: optional_var("TOKEN_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("AppData/strava_tokens.json")),
            token_key_path: match optional_var("TOKEN_KEY_PATH") {
                Some(p) => PathBuf::from(p),
                None => default_key_path()?,
            },
            strava_oauth_base_url: optional_var("STRAVA_OAUTH_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OAUTH_BASE_URL.to_string()),
            strava_api_base_url: optional_var("STRAVA_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        })
    }
}

/// Read an environment variable, treating blank values as unset.
fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `$XDG_CONFIG_HOME/run-dashboard/token.key`, else under `$HOME/.config`.
fn default_key_path() -> Result<PathBuf, ConfigError> {
    let config_dir = match optional_var("XDG_CONFIG_HOME") {
        Some(dir) => PathBuf::from(dir),
        None => optional_var("HOME")
            .or_else(|| optional_var("USERPROFILE"))
            .map(|home| PathBuf::from(home).join(".config"))
            .ok_or(ConfigError::Missing("TOKEN_KEY_PATH"))?,
    };
    Ok(config_dir.join("run-dashboard").join("token.key"))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
