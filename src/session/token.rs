//! Token pair, expiry decoding and the time-driven token state.
//!
//! Access tokens are backend-issued JWTs. The gateway only reads the `exp`
//! claim to schedule refreshes; signature verification is the backend's job.

use base64ct::{Base64UrlUnpadded, Encoding};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// A token within this window of its expiry is treated as already expiring.
pub const SKEW_BUDGET_MS: i64 = 10_000;

/// Lifetime synthesized for federated sessions, which carry no backend expiry.
pub const FEDERATED_TTL_MS: i64 = 60 * 60 * 1000;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token format")]
    Format,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("expiry claim out of range")]
    Expiry,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenState {
    /// `now < expires_at - skew`.
    Fresh,
    /// Inside the skew window or past expiry; must refresh before use.
    Expiring,
    /// A refresh call for this session is in flight.
    Refreshing,
    /// Refresh failed or impossible; the session must be re-established.
    Invalid,
}

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: i64,
}

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

/// Decode the payload segment of a compact JWT without verifying it.
///
/// # Errors
/// Returns an error if the token is not three dot-separated segments or the
/// payload is not base64url-encoded JSON.
pub fn decode_claims<T: for<'de> Deserialize<'de>>(token: &str) -> Result<T, TokenError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Format);
    };
    let bytes = Base64UrlUnpadded::decode_vec(payload.trim_end_matches('='))
        .map_err(|_| TokenError::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Expiry of a JWT access token, in epoch milliseconds.
///
/// # Errors
/// Returns an error if the token cannot be decoded or carries no usable `exp`.
pub fn decode_expiry_ms(token: &str) -> Result<i64, TokenError> {
    let claim: ExpiryClaim = decode_claims(token)?;
    claim.exp.checked_mul(1000).ok_or(TokenError::Expiry)
}

/// Access token, optional refresh token and access expiry, always swapped together.
#[derive(Clone)]
pub struct TokenPair {
    access_token: SecretString,
    refresh_token: Option<SecretString>,
    expires_at_ms: i64,
}

impl TokenPair {
    #[must_use]
    pub fn new(
        access_token: SecretString,
        refresh_token: Option<SecretString>,
        expires_at_ms: i64,
    ) -> Self {
        // An empty refresh token is the same as none.
        let refresh_token = refresh_token.filter(|token| !token.expose_secret().is_empty());
        Self {
            access_token,
            refresh_token,
            expires_at_ms,
        }
    }

    /// Build a pair from backend-issued tokens, reading expiry from the access JWT.
    ///
    /// # Errors
    /// Returns an error if the access token's `exp` claim cannot be decoded.
    pub fn from_backend(access: String, refresh: Option<String>) -> Result<Self, TokenError> {
        let expires_at_ms = decode_expiry_ms(&access)?;
        Ok(Self::new(
            SecretString::from(access),
            refresh.map(SecretString::from),
            expires_at_ms,
        ))
    }

    /// Federated sessions get a synthetic one-hour expiry and no refresh token.
    #[must_use]
    pub fn federated(identity_token: String, now_ms: i64) -> Self {
        Self::new(
            SecretString::from(identity_token),
            None,
            now_ms.saturating_add(FEDERATED_TTL_MS),
        )
    }

    /// Successor pair after a refresh; the refresh token rotates only when the backend sent one.
    ///
    /// # Errors
    /// Returns an error if the new access token's expiry cannot be decoded.
    pub fn rotated(&self, access: String, refresh: Option<String>) -> Result<Self, TokenError> {
        let expires_at_ms = decode_expiry_ms(&access)?;
        let refresh_token = refresh
            .filter(|token| !token.is_empty())
            .map(SecretString::from)
            .or_else(|| self.refresh_token.clone());
        Ok(Self::new(
            SecretString::from(access),
            refresh_token,
            expires_at_ms,
        ))
    }

    #[must_use]
    pub fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<&SecretString> {
        self.refresh_token.as_ref()
    }

    #[must_use]
    pub fn expires_at_ms(&self) -> i64 {
        self.expires_at_ms
    }

    /// Time-driven classification; evaluated lazily, there is no timer.
    #[must_use]
    pub fn state(&self, now_ms: i64) -> TokenState {
        if now_ms < self.expires_at_ms.saturating_sub(SKEW_BUDGET_MS) {
            TokenState::Fresh
        } else {
            TokenState::Expiring
        }
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"***")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "***"),
            )
            .field("expires_at_ms", &self.expires_at_ms)
            .finish()
    }
}

/// Build an unsigned JWT carrying `exp`, for tests that need decodable tokens.
#[cfg(test)]
pub(crate) fn test_jwt(exp_seconds: i64) -> String {
    let header = Base64UrlUnpadded::encode_string(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = Base64UrlUnpadded::encode_string(
        format!(r#"{{"exp":{exp_seconds},"user_id":7}}"#).as_bytes(),
    );
    format!("{header}.{claims}.c2lnbmF0dXJl")
}
