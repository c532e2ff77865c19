// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Run dashboard: a personal Strava running dashboard backend
//!
//! This crate brokers OAuth access to Strava for a single athlete, keeps the
//! credential encrypted on local disk, refreshes it transparently, and
//! serves recent runs in a display-ready shape.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use config::Config;
use services::{StravaClient, TokenManager};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub tokens: TokenManager,
    pub strava: StravaClient,
}
