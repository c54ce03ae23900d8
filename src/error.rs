/// Error types for the Strava authorization flows
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("missing required configuration: {0}")]
    MissingConfig(String),

    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("invalid endpoint URL: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("could not locate authorization code in input")]
    CodeNotFound,

    #[error("no redirect URL was entered")]
    EmptyInput,

    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Strava API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("access token expired at {expires_at}")]
    TokenExpired { expires_at: i64 },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Broad failure category, so callers can branch without matching every variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Absent or unusable configuration
    Configuration,
    /// Malformed operator input or console failure
    Input,
    /// The remote service refused or could not be reached
    Service,
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::MissingConfig(_)
            | AuthError::EnvFile { .. }
            | AuthError::InvalidEndpoint(_) => ErrorKind::Configuration,
            AuthError::CodeNotFound | AuthError::EmptyInput | AuthError::IoError(_) => {
                ErrorKind::Input
            }
            AuthError::AuthorizationDenied(_)
            | AuthError::HttpError(_)
            | AuthError::Api { .. }
            | AuthError::JsonError(_)
            | AuthError::InvalidResponse(_)
            | AuthError::TokenExpired { .. } => ErrorKind::Service,
        }
    }
}

impl ErrorKind {
    /// Process exit status following the sysexits convention
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Configuration => 78,
            ErrorKind::Input => 65,
            ErrorKind::Service => 69,
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
