// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strava activity records and the run projection served to the dashboard.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Summary activity as returned by `GET /athlete/activities`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Activity {
    pub id: u64,
    pub name: String,
    /// Activity type (Run, Ride, Hike, etc.)
    #[serde(rename = "type")]
    pub kind: String,
    /// Start time in the athlete's local timezone (ISO 8601, no offset)
    pub start_date_local: String,
    /// Distance in meters
    pub distance: f64,
    /// Moving time in seconds
    pub moving_time: u64,
    /// Average speed in meters per second
    pub average_speed: f64,
}

impl Activity {
    /// Whether this activity is a run (case-insensitive).
    pub fn is_run(&self) -> bool {
        self.kind.eq_ignore_ascii_case("run")
    }
}

/// A run as displayed by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RunProjection {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub name: String,
    pub start_date_local: String,
    pub distance_km: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub moving_time_sec: u64,
    pub average_pace_min_per_km: f64,
}
