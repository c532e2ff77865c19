// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod activity;
pub mod strava;
pub mod tokens;

pub use activity::{project_runs, recent_runs};
pub use strava::{StravaClient, StravaError, TokenEnvelope};
pub use tokens::{TokenManager, TokenStatus};
