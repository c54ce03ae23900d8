/// Athlete records returned by the Strava API
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Summary attached to the authorization-code token response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteSummary {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
}

/// Profile of the authenticated athlete (`GET /athlete`)
///
/// Fields not modelled here are kept in `extra` so that a verbose dump shows
/// the complete record as the API returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Athlete {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub premium: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Athlete {
    /// First and last name joined by a space, skipping whichever is absent
    pub fn display_name(&self) -> String {
        [self.firstname.as_deref(), self.lastname.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
