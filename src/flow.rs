/// Operator-facing authorization and refresh flows
use crate::athlete::Athlete;
use crate::config::Credentials;
use crate::error::{AuthError, Result};
use crate::oauth::{AuthorizedClient, StravaApi, DEFAULT_REDIRECT_URI, DEFAULT_SCOPES};
use crate::redirect::{missing_scopes, parse_redirect};
use crate::token::TokenResponse;
use std::io::{BufRead, Write};
use tracing::{info, warn};

pub const REDIRECT_PROMPT: &str = "paste redirect URL: ";

/// Shown after a code exchange whose tokens were not printed
pub const TOKENS_WITHHELD_NOTICE: &str = "tokens were not shown; the authorization code is now spent, \
     so re-run `authorize --reveal-tokens` to obtain a refresh token you can store";

/// What the flows print besides the essentials
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Print the token payload (sensitive)
    pub reveal_tokens: bool,
    /// Print every field of the athlete profile
    pub verbose: bool,
}

/// Inputs of the first-time authorization flow
#[derive(Debug, Clone)]
pub struct AuthorizeRequest<'a> {
    pub credentials: &'a Credentials,
    pub redirect_uri: &'a str,
    pub scopes: &'a [&'a str],
}

impl<'a> AuthorizeRequest<'a> {
    pub fn new(credentials: &'a Credentials) -> Self {
        Self {
            credentials,
            redirect_uri: DEFAULT_REDIRECT_URI,
            scopes: &DEFAULT_SCOPES,
        }
    }
}

/// Print the token payload under a sensitivity warning
pub fn print_tokens<W: Write>(out: &mut W, token: &TokenResponse) -> Result<()> {
    writeln!(
        out,
        "\noutputting access and refresh tokens (DO NOT SHARE OR COMMIT):"
    )?;
    writeln!(out, "{}", serde_json::to_string_pretty(token)?)?;
    Ok(())
}

/// Print the full athlete record
pub fn print_profile<W: Write>(out: &mut W, athlete: &Athlete) -> Result<()> {
    writeln!(out, "\n{}", serde_json::to_string_pretty(athlete)?)?;
    Ok(())
}

/// Build and print the authorization URL, returning it
pub fn show_authorization_url<A, W>(api: &A, request: &AuthorizeRequest<'_>, out: &mut W) -> Result<String>
where
    A: StravaApi + ?Sized,
    W: Write,
{
    let url = api.authorization_url(
        &request.credentials.client_id,
        request.redirect_uri,
        request.scopes,
    )?;
    writeln!(out, "\nClick URL: {url}\n")?;
    out.flush()?;
    Ok(url)
}

/// Prompt for the redirect URL and exchange its code for tokens
pub fn exchange_pasted_code<A, R, W>(
    api: &A,
    request: &AuthorizeRequest<'_>,
    input: &mut R,
    out: &mut W,
    options: OutputOptions,
) -> Result<TokenResponse>
where
    A: StravaApi + ?Sized,
    R: BufRead,
    W: Write,
{
    write!(out, "{REDIRECT_PROMPT}")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(AuthError::EmptyInput);
    }

    let redirect = parse_redirect(&line)?;
    if let Some(granted) = &redirect.granted_scopes {
        let missing = missing_scopes(request.scopes, granted);
        if !missing.is_empty() {
            warn!(?missing, "athlete did not grant every requested scope");
            writeln!(out, "\nwarning: scopes not granted: {}", missing.join(", "))?;
        }
    }

    let token = api.exchange_code(request.credentials, &redirect.code)?;
    info!("authorization complete");

    if options.reveal_tokens {
        print_tokens(out, &token)?;
    } else {
        writeln!(out, "\nnotice: {TOKENS_WITHHELD_NOTICE}")?;
    }
    Ok(token)
}

/// First-time setup: URL, operator paste, code exchange
pub fn authorize<A, R, W>(
    api: &A,
    request: &AuthorizeRequest<'_>,
    input: &mut R,
    out: &mut W,
    options: OutputOptions,
) -> Result<TokenResponse>
where
    A: StravaApi + ?Sized,
    R: BufRead,
    W: Write,
{
    show_authorization_url(api, request, out)?;
    exchange_pasted_code(api, request, input, out, options)
}

/// Refresh the access token and verify it by fetching the athlete
///
/// The configured refresh token is reused as-is; if Strava hands back a
/// different one the operator is told to update their stored copy.
pub fn refresh_and_verify<'a, A, W>(
    api: &'a A,
    credentials: &Credentials,
    refresh_token: &str,
    out: &mut W,
    options: OutputOptions,
) -> Result<AuthorizedClient<'a, A>>
where
    A: StravaApi + ?Sized,
    W: Write,
{
    let token = api.refresh_access_token(credentials, refresh_token)?;

    if options.reveal_tokens {
        print_tokens(out, &token)?;
    }

    if token.refresh_token != refresh_token {
        warn!("refresh token was rotated by the service");
        writeln!(
            out,
            "\nnotice: Strava issued a new refresh token; update your stored secret"
        )?;
    }

    let client = AuthorizedClient::new(api, token)?;
    let athlete = client.athlete()?;
    writeln!(
        out,
        "\nSuccessfully authenticated athlete: {}",
        athlete.display_name()
    )?;
    info!(
        athlete_id = ?athlete.id,
        expires_in_secs = client.token().remaining_secs(),
        "access token verified"
    );

    if options.verbose {
        print_profile(out, &athlete)?;
    }

    Ok(client)
}
