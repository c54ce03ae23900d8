/// Token payloads returned by the Strava token endpoint
use crate::athlete::AthleteSummary;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Token data
///
/// Both the authorization-code exchange and the refresh grant return this
/// shape. Only the code exchange includes the athlete summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry as seconds since the Unix epoch
    pub expires_at: i64,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub athlete: Option<AthleteSummary>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenResponse {
    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        unix_now() >= self.expires_at
    }

    /// Seconds left before expiry, zero once expired
    pub fn remaining_secs(&self) -> i64 {
        (self.expires_at - unix_now()).max(0)
    }
}

pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
