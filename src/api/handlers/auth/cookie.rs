//! Session cookie and bearer extraction.

use crate::api::state::GatewayConfig;
use axum::http::{
    HeaderMap, HeaderValue,
    header::{AUTHORIZATION, COOKIE, InvalidHeaderValue},
};

pub const SESSION_COOKIE_NAME: &str = "campus_session";

/// `HttpOnly` cookie carrying the opaque session id.
pub(crate) fn session_cookie(
    config: &GatewayConfig,
    session_id: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={session_id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn clear_session_cookie(
    config: &GatewayConfig,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Session id from `Authorization: Bearer` or the session cookie, bearer first.
pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            (key.trim() == SESSION_COOKIE_NAME && !val.trim().is_empty())
                .then(|| val.trim().to_string())
        })
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn cookie_attributes() -> Result<()> {
        let config = GatewayConfig::new("https://portal.campus.edu".to_string())
            .with_session_ttl_seconds(60);
        let cookie = session_cookie(&config, "01HX")?;
        assert_eq!(
            cookie.to_str()?,
            "campus_session=01HX; Path=/; HttpOnly; SameSite=Lax; Max-Age=60; Secure"
        );

        let cleared = clear_session_cookie(&GatewayConfig::new("http://localhost:3000".to_string()))?;
        assert_eq!(
            cleared.to_str()?,
            "campus_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
        );
        Ok(())
    }

    #[test]
    fn extracts_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; campus_session=abc123; lang=en"),
        );
        assert_eq!(extract_session_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("campus_session=cookie"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer header"));
        assert_eq!(extract_session_token(&headers), Some("header".to_string()));
    }

    #[test]
    fn empty_values_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("campus_session="));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_session_token(&headers), None);
    }
}
