/// Credential loading from the process environment and `.env` files
use crate::error::{AuthError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CLIENT_ID_VAR: &str = "CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "CLIENT_SECRET";
pub const REFRESH_TOKEN_VAR: &str = "REFRESH_TOKEN1";

/// Application credentials issued by Strava for the registered API app
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Read `CLIENT_ID` and `CLIENT_SECRET` from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Read credentials through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            client_id: required(&lookup, CLIENT_ID_VAR)?,
            client_secret: required(&lookup, CLIENT_SECRET_VAR)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Read the stored refresh token from the named environment variable
pub fn refresh_token_from_env(var: &str) -> Result<String> {
    refresh_token_from_lookup(env_lookup, var)
}

pub fn refresh_token_from_lookup<F>(lookup: F, var: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    required(&lookup, var)
}

/// Load variables from a `.env` file into the process environment
///
/// With no explicit path the nearest `.env` is used and a missing file is
/// not an error, since the variables may already be exported. An explicit
/// path must exist. Variables already set in the environment win.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|source| AuthError::EnvFile {
                path: path.to_path_buf(),
                source,
            })?;
            debug!(path = %path.display(), "loaded environment file");
            Ok(Some(path.to_path_buf()))
        }
        None => match dotenvy::dotenv() {
            Ok(found) => {
                debug!(path = %found.display(), "loaded environment file");
                Ok(Some(found))
            }
            Err(err) if err.not_found() => {
                debug!("no .env file found, using process environment");
                Ok(None)
            }
            Err(source) => Err(AuthError::EnvFile {
                path: PathBuf::from(".env"),
                source,
            }),
        },
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn required<F>(lookup: &F, name: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(AuthError::MissingConfig(name.to_string())),
    }
}
