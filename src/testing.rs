/// In-memory `StravaApi` used by unit tests
use crate::athlete::Athlete;
use crate::config::Credentials;
use crate::error::{AuthError, Result};
use crate::oauth::{build_authorization_url, OAuthConfig, StravaApi};
use crate::token::{unix_now, TokenResponse};
use std::cell::RefCell;
use std::collections::VecDeque;

pub fn token(access: &str, refresh: &str) -> TokenResponse {
    TokenResponse {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_at: unix_now() + 21600,
        expires_in: Some(21600),
        token_type: "Bearer".to_string(),
        athlete: None,
    }
}

/// Scripted responses, consumed in order
#[derive(Default)]
pub struct MockApi {
    tokens: RefCell<VecDeque<TokenResponse>>,
    athlete: Option<Athlete>,
    exchanged_codes: RefCell<Vec<String>>,
    refreshed_with: RefCell<Vec<String>>,
    profile_tokens: RefCell<Vec<String>>,
}

impl MockApi {
    pub fn with_tokens(self, tokens: impl IntoIterator<Item = TokenResponse>) -> Self {
        self.tokens.borrow_mut().extend(tokens);
        self
    }

    pub fn with_athlete(mut self, first: &str, last: &str) -> Self {
        self.athlete = Some(Athlete {
            id: Some(42),
            firstname: Some(first.to_string()),
            lastname: Some(last.to_string()),
            ..Default::default()
        });
        self
    }

    pub fn exchanged_codes(&self) -> Vec<String> {
        self.exchanged_codes.borrow().clone()
    }

    pub fn refreshed_with(&self) -> Vec<String> {
        self.refreshed_with.borrow().clone()
    }

    pub fn profile_tokens(&self) -> Vec<String> {
        self.profile_tokens.borrow().clone()
    }

    fn next_token(&self) -> Result<TokenResponse> {
        self.tokens.borrow_mut().pop_front().ok_or(AuthError::Api {
            status: 400,
            message: "Bad Request".to_string(),
        })
    }
}

impl StravaApi for MockApi {
    fn authorization_url(
        &self,
        client_id: &str,
        redirect_uri: &str,
        scopes: &[&str],
    ) -> Result<String> {
        build_authorization_url(&OAuthConfig::default(), client_id, redirect_uri, scopes)
    }

    fn exchange_code(&self, _credentials: &Credentials, code: &str) -> Result<TokenResponse> {
        self.exchanged_codes.borrow_mut().push(code.to_string());
        self.next_token()
    }

    fn refresh_access_token(
        &self,
        _credentials: &Credentials,
        refresh_token: &str,
    ) -> Result<TokenResponse> {
        self.refreshed_with.borrow_mut().push(refresh_token.to_string());
        self.next_token()
    }

    fn fetch_athlete(&self, access_token: &str) -> Result<Athlete> {
        self.profile_tokens.borrow_mut().push(access_token.to_string());
        self.athlete.clone().ok_or(AuthError::Api {
            status: 401,
            message: "Authorization Error".to_string(),
        })
    }
}
