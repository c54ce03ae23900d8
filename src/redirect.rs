/// Parsing of the redirect URL the operator pastes after granting access
use crate::error::{AuthError, Result};
use regex::Regex;
use std::sync::OnceLock;
use url::{form_urlencoded, Url};

/// Authorization result carried by the redirect URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectParams {
    pub code: String,
    /// Scopes the athlete actually granted, when the redirect lists them
    pub granted_scopes: Option<Vec<String>>,
}

fn code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // [^&]+ captures every character up to the next parameter separator
    PATTERN.get_or_init(|| Regex::new(r"code=([^&]+)").expect("static pattern is valid"))
}

/// Extract the authorization code from a pasted redirect URL
///
/// Takes the first `code=` occurrence and captures up to the next `&` or the
/// end of input.
pub fn extract_code(redirect_url: &str) -> Result<String> {
    code_pattern()
        .captures(redirect_url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(AuthError::CodeNotFound)
}

/// Parse the full redirect, surfacing a denial before looking for a code
pub fn parse_redirect(redirect_url: &str) -> Result<RedirectParams> {
    let input = redirect_url.trim();
    if input.is_empty() {
        return Err(AuthError::EmptyInput);
    }

    let pairs = query_pairs(input);
    let param = |name: &str| {
        pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    };

    if let Some(error) = param("error") {
        return Err(AuthError::AuthorizationDenied(error));
    }

    let code = extract_code(input)?;
    let granted_scopes = param("scope").map(|scope| {
        scope
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    });

    Ok(RedirectParams {
        code,
        granted_scopes,
    })
}

/// Decoded query parameters of a full URL or a bare `a=b&c=d` query
fn query_pairs(input: &str) -> Vec<(String, String)> {
    if let Ok(url) = Url::parse(input) {
        return url.query_pairs().into_owned().collect();
    }
    let query = input.split_once('?').map_or(input, |(_, query)| query);
    let query = query.split('#').next().unwrap_or_default();
    form_urlencoded::parse(query.as_bytes()).into_owned().collect()
}

/// Requested scopes missing from the granted list
pub fn missing_scopes<'a>(requested: &[&'a str], granted: &[String]) -> Vec<&'a str> {
    requested
        .iter()
        .copied()
        .filter(|scope| !granted.iter().any(|g| g == scope))
        .collect()
}
