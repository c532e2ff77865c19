// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The Strava OAuth credential held by the dashboard.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Time before expiry at which an access token is treated as unusable.
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Access token, its expiry and the refresh token that can replace it.
///
/// A credential is always fully populated. Code that cannot produce all
/// three fields must treat the credential as absent rather than build a
/// partial one.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_token: String,
}

impl Credential {
    /// Whether the access token can still be handed to a caller at `now`.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) < self.expires_at
    }
}

// Tokens are bearer secrets; keep them out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}
