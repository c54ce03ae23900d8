//! strava-auth - OAuth 2.0 authorization code flow for a Strava athlete
//!
//! Obtains an access/refresh token pair for one athlete and later turns the
//! stored refresh token into a verified, authorized client.
//!
//! # Flows
//!
//! - **authorize**: print the authorization URL, read the pasted redirect
//!   URL, exchange its code for tokens
//! - **refresh**: exchange the stored refresh token for a new access token
//!   and confirm it by fetching the athlete profile
//!
//! All Strava traffic goes through the [`oauth::StravaApi`] trait, so the
//! flows can run against [`client::StravaClient`] or any substitute.
//!
//! # Example
//!
//! ```
//! use strava_auth::prelude::*;
//!
//! let url = build_authorization_url(
//!     &OAuthConfig::default(),
//!     "12345",
//!     DEFAULT_REDIRECT_URI,
//!     &DEFAULT_SCOPES,
//! )
//! .unwrap();
//! assert!(url.starts_with("https://www.strava.com/oauth/authorize?client_id=12345"));
//!
//! let code = extract_code("http://localhost/exchange_token?state=&code=ABC123&scope=read").unwrap();
//! assert_eq!(code, "ABC123");
//! ```

pub mod athlete;
pub mod client;
pub mod config;
pub mod error;
pub mod flow;
pub mod oauth;
pub mod redirect;
pub mod token;

#[cfg(test)]
mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::athlete::{Athlete, AthleteSummary};
    pub use crate::client::StravaClient;
    pub use crate::config::{load_env_file, Credentials};
    pub use crate::error::{AuthError, ErrorKind};
    pub use crate::flow::{authorize, refresh_and_verify, AuthorizeRequest, OutputOptions};
    pub use crate::oauth::{
        build_authorization_url, ApprovalPrompt, AuthorizedClient, OAuthConfig, StravaApi,
        DEFAULT_REDIRECT_URI, DEFAULT_SCOPES,
    };
    pub use crate::redirect::extract_code;
    pub use crate::token::TokenResponse;
}
