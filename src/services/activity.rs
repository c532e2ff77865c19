// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Projection of Strava activities into dashboard runs.

use crate::error::AppError;
use crate::models::{Activity, RunProjection};
use crate::services::strava::StravaClient;
use crate::services::tokens::TokenManager;

/// Meters per kilometer divided by seconds per minute: converts a speed in
/// m/s into a pace in min/km via `PACE_FACTOR / speed`.
const PACE_FACTOR: f64 = 1000.0 / 60.0;

/// Keep only runs, in their original order, converted for display.
pub fn project_runs(activities: &[Activity]) -> Vec<RunProjection> {
    activities
        .iter()
        .filter(|a| a.is_run())
        .map(project_run)
        .collect()
}

fn project_run(activity: &Activity) -> RunProjection {
    // Stationary or paused recordings report zero speed.
    let pace = if activity.average_speed > 0.0 {
        PACE_FACTOR / activity.average_speed
    } else {
        0.0
    };

    RunProjection {
        id: activity.id,
        name: activity.name.clone(),
        start_date_local: activity.start_date_local.clone(),
        distance_km: round2(activity.distance / 1000.0),
        moving_time_sec: activity.moving_time,
        average_pace_min_per_km: round2(pace),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Fetch the athlete's latest `per_page` activities and project the runs.
pub async fn recent_runs(
    tokens: &TokenManager,
    client: &StravaClient,
    per_page: u32,
) -> Result<Vec<RunProjection>, AppError> {
    let access_token = tokens.get_valid_access_token().await?;
    let activities = client.list_activities(&access_token, per_page).await?;
    let runs = project_runs(&activities);

    tracing::debug!(
        fetched = activities.len(),
        runs = runs.len(),
        "Projected recent runs"
    );
    Ok(runs)
}
