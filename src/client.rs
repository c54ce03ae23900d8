/// Blocking HTTP implementation of [`StravaApi`]
use crate::athlete::Athlete;
use crate::config::Credentials;
use crate::error::{AuthError, Result};
use crate::oauth::{build_authorization_url, OAuthConfig, StravaApi};
use crate::token::TokenResponse;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("strava-auth/", env!("CARGO_PKG_VERSION"));

/// Error body returned by Strava on failed requests
#[derive(Debug, Deserialize)]
struct FaultResponse {
    message: String,
    #[serde(default)]
    errors: Vec<FaultDetail>,
}

#[derive(Debug, Deserialize)]
struct FaultDetail {
    #[serde(default)]
    resource: Option<String>,
    #[serde(default)]
    field: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl FaultResponse {
    fn describe(&self) -> String {
        let details: Vec<String> = self
            .errors
            .iter()
            .map(|e| {
                format!(
                    "{}.{} {}",
                    e.resource.as_deref().unwrap_or("?"),
                    e.field.as_deref().unwrap_or("?"),
                    e.code.as_deref().unwrap_or("?")
                )
            })
            .collect();

        if details.is_empty() {
            self.message.clone()
        } else {
            format!("{} ({})", self.message, details.join(", "))
        }
    }
}

/// Strava API client
pub struct StravaClient {
    config: OAuthConfig,
    http: Client,
}

impl StravaClient {
    /// Create a client for the public Strava endpoints
    pub fn new(config: OAuthConfig) -> Result<Self> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_http_client(config, http))
    }

    /// Create a client around a preconfigured HTTP client
    pub fn with_http_client(config: OAuthConfig, http: Client) -> Self {
        Self { config, http }
    }

    fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .http
            .post(&self.config.token_endpoint)
            .header("Accept", "application/json")
            .form(params)
            .send()?;

        decode(response)
    }
}

impl StravaApi for StravaClient {
    fn authorization_url(
        &self,
        client_id: &str,
        redirect_uri: &str,
        scopes: &[&str],
    ) -> Result<String> {
        build_authorization_url(&self.config, client_id, redirect_uri, scopes)
    }

    fn exchange_code(&self, credentials: &Credentials, code: &str) -> Result<TokenResponse> {
        debug!(endpoint = %self.config.token_endpoint, "exchanging authorization code");
        let token = self.request_token(&[
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
        ])?;
        info!(expires_at = token.expires_at, "authorization code exchanged");
        Ok(token)
    }

    fn refresh_access_token(
        &self,
        credentials: &Credentials,
        refresh_token: &str,
    ) -> Result<TokenResponse> {
        debug!(endpoint = %self.config.token_endpoint, "refreshing access token");
        let token = self.request_token(&[
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])?;
        info!(expires_at = token.expires_at, "access token refreshed");
        Ok(token)
    }

    fn fetch_athlete(&self, access_token: &str) -> Result<Athlete> {
        let url = format!("{}/athlete", self.config.api_base_url.trim_end_matches('/'));
        debug!(%url, "fetching authenticated athlete");

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .header("Accept", "application/json")
            .send()?;

        decode(response)
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text()?;

    if !status.is_success() {
        let message = match serde_json::from_str::<FaultResponse>(&body) {
            Ok(fault) => fault.describe(),
            Err(_) if body.trim().is_empty() => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
            Err(_) => body.trim().to_string(),
        };
        return Err(AuthError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        AuthError::InvalidResponse(format!("unexpected response body ({e}): {body:.200}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::thread;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN_BODY: &str = r#"{"token_type":"Bearer","access_token":"tok_new","expires_at":4102444800,"expires_in":21600,"refresh_token":"tok_old"}"#;

    /// Run a blocking client call against the mock server on its own thread
    fn call<T, F>(server: &MockServer, f: F) -> Result<T>
    where
        F: FnOnce(&StravaClient) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let base = server.uri();
        thread::spawn(move || {
            let config = OAuthConfig {
                token_endpoint: format!("{base}/oauth/token"),
                api_base_url: format!("{base}/api/v3"),
                ..Default::default()
            };
            let http = Client::builder().no_proxy().build().unwrap();
            f(&StravaClient::with_http_client(config, http))
        })
        .join()
        .unwrap()
    }

    fn json(status: u16, body: &str) -> ResponseTemplate {
        ResponseTemplate::new(status).set_body_raw(body.to_string(), "application/json")
    }

    async fn form_of_last_request(server: &MockServer) -> HashMap<String, String> {
        let received = server.received_requests().await.unwrap();
        let last = received.last().unwrap();
        url::form_urlencoded::parse(&last.body).into_owned().collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_exchange_code_posts_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=ABC123"))
            .respond_with(json(200, TOKEN_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let token = call(&server, |client| {
            client.exchange_code(&Credentials::new("abc", "xyz"), "ABC123")
        })
        .unwrap();
        assert_eq!(token.access_token, "tok_new");

        let params = form_of_last_request(&server).await;
        assert_eq!(params["client_id"], "abc");
        assert_eq!(params["client_secret"], "xyz");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_refresh_posts_refresh_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=tok_old"))
            .respond_with(json(200, TOKEN_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let token = call(&server, |client| {
            client.refresh_access_token(&Credentials::new("abc", "xyz"), "tok_old")
        })
        .unwrap();
        assert_eq!(token.refresh_token, "tok_old");
        assert_eq!(token.expires_at, 4102444800);

        let params = form_of_last_request(&server).await;
        assert!(!params.contains_key("code"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fetch_athlete_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/athlete"))
            .and(header("authorization", "Bearer tok_new"))
            .respond_with(json(
                200,
                r#"{"id":7,"firstname":"Jane","lastname":"Doe","weight":61.2}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let athlete = call(&server, |client| client.fetch_athlete("tok_new")).unwrap();
        assert_eq!(athlete.display_name(), "Jane Doe");
        assert_eq!(athlete.extra["weight"], 61.2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_error_response_carries_service_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(json(
                400,
                r#"{"message":"Bad Request","errors":[{"resource":"RefreshToken","field":"refresh_token","code":"invalid"}]}"#,
            ))
            .mount(&server)
            .await;

        let err = call(&server, |client| {
            client.refresh_access_token(&Credentials::new("abc", "xyz"), "revoked")
        })
        .unwrap_err();

        match err {
            AuthError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Bad Request (RefreshToken.refresh_token invalid)");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unauthorized_profile_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/athlete"))
            .respond_with(json(401, r#"{"message":"Authorization Error","errors":[]}"#))
            .mount(&server)
            .await;

        let err = call(&server, |client| client.fetch_athlete("expired")).unwrap_err();
        assert!(matches!(err, AuthError::Api { status: 401, ref message } if message == "Authorization Error"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_undecodable_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = call(&server, |client| {
            client.exchange_code(&Credentials::new("abc", "xyz"), "ABC123")
        })
        .unwrap_err();
        assert!(matches!(err, AuthError::InvalidResponse(_)));
    }
}
