// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run dashboard API server
//!
//! Connects a single athlete's Strava account and serves their recent runs.

use anyhow::Context;
use run_dashboard::{
    config::Config,
    services::{StravaClient, TokenManager},
    store::{FileCredentialStore, LocalCipher},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.port, "Starting run dashboard API");

    for (name, value) in [
        ("STRAVA_CLIENT_ID", &config.strava.client_id),
        ("STRAVA_CLIENT_SECRET", &config.strava.client_secret),
        ("STRAVA_REDIRECT_URI", &config.strava.redirect_uri),
    ] {
        if value.is_none() {
            tracing::warn!(setting = name, "Strava setting not configured");
        }
    }

    // Open the credential store
    let cipher = LocalCipher::for_current_user(&config.token_key_path)
        .context("Failed to initialize token encryption key")?;
    let store = FileCredentialStore::new(config.token_store_path.clone(), cipher);
    tracing::info!(path = %store.path().display(), "Credential store ready");

    let strava = StravaClient::with_base_urls(
        &config.strava_oauth_base_url,
        &config.strava_api_base_url,
    );
    let tokens = TokenManager::new(config.strava.clone(), strava.clone(), Arc::new(store));

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        tokens,
        strava,
    });

    // Build router
    let app = run_dashboard::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("run_dashboard=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
