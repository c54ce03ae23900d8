/// OAuth 2.0 authorization-code flow for Strava
use crate::athlete::Athlete;
use crate::config::Credentials;
use crate::error::{AuthError, Result};
use crate::token::TokenResponse;
use tracing::debug;
use url::Url;

pub const AUTHORIZATION_ENDPOINT: &str = "https://www.strava.com/oauth/authorize";
pub const TOKEN_ENDPOINT: &str = "https://www.strava.com/oauth/token";
pub const API_BASE_URL: &str = "https://www.strava.com/api/v3";

/// Loopback address registered as the app's authorization callback domain
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost/exchange_token";

/// Permissions requested during authorization
pub const DEFAULT_SCOPES: [&str; 4] = ["read", "read_all", "profile:read_all", "activity:read_all"];

/// Whether Strava shows the consent screen to an athlete who already granted access
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApprovalPrompt {
    #[default]
    Auto,
    Force,
}

impl ApprovalPrompt {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalPrompt::Auto => "auto",
            ApprovalPrompt::Force => "force",
        }
    }
}

/// OAuth 2.0 configuration
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub api_base_url: String,
    pub approval_prompt: ApprovalPrompt,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            authorization_endpoint: AUTHORIZATION_ENDPOINT.to_string(),
            token_endpoint: TOKEN_ENDPOINT.to_string(),
            api_base_url: API_BASE_URL.to_string(),
            approval_prompt: ApprovalPrompt::Auto,
        }
    }
}

/// Build the URL an athlete opens to grant the app access
pub fn build_authorization_url(
    config: &OAuthConfig,
    client_id: &str,
    redirect_uri: &str,
    scopes: &[&str],
) -> Result<String> {
    if client_id.trim().is_empty() {
        return Err(AuthError::MissingConfig(crate::config::CLIENT_ID_VAR.to_string()));
    }

    let mut url = Url::parse(&config.authorization_endpoint)?;
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("approval_prompt", config.approval_prompt.as_str())
        .append_pair("scope", &scopes.join(","));

    debug!(endpoint = %config.authorization_endpoint, scopes = scopes.len(), "built authorization URL");
    Ok(url.to_string())
}

/// Operations the authorization flows need from the Strava service
///
/// [`crate::client::StravaClient`] talks to the real API; tests substitute
/// their own implementation.
pub trait StravaApi {
    /// Build the authorization URL for the given app and callback
    fn authorization_url(&self, client_id: &str, redirect_uri: &str, scopes: &[&str])
        -> Result<String>;

    /// Exchange a single-use authorization code for a token pair
    fn exchange_code(&self, credentials: &Credentials, code: &str) -> Result<TokenResponse>;

    /// Obtain a fresh access token from a refresh token
    fn refresh_access_token(
        &self,
        credentials: &Credentials,
        refresh_token: &str,
    ) -> Result<TokenResponse>;

    /// Fetch the profile of the athlete the access token belongs to
    fn fetch_athlete(&self, access_token: &str) -> Result<Athlete>;
}

/// Client authorized with one access token
pub struct AuthorizedClient<'a, A: StravaApi + ?Sized> {
    api: &'a A,
    token: TokenResponse,
}

impl<'a, A: StravaApi + ?Sized> AuthorizedClient<'a, A> {
    /// Bind a token to the API it was issued by
    ///
    /// Fails if the token has already expired.
    pub fn new(api: &'a A, token: TokenResponse) -> Result<Self> {
        if token.is_expired() {
            return Err(AuthError::TokenExpired {
                expires_at: token.expires_at,
            });
        }
        Ok(Self { api, token })
    }

    pub fn access_token(&self) -> &str {
        &self.token.access_token
    }

    pub fn token(&self) -> &TokenResponse {
        &self.token
    }

    /// Fetch the authenticated athlete's profile
    pub fn athlete(&self) -> Result<Athlete> {
        self.api.fetch_athlete(&self.token.access_token)
    }
}
