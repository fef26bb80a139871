//! Google OAuth 2.0 authorization-code flow.
//!
//! Only enabled when both client credentials are configured. The `state`
//! parameter is a ULID nonce remembered for ten minutes and consumed once.

use crate::{error::AuthError, session::token::decode_claims};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use tracing::{Instrument, debug, info_span};
use ulid::Ulid;
use url::Url;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const STATE_TTL: Duration = Duration::from_secs(10 * 60);
pub const CALLBACK_PATH: &str = "/api/auth/callback/google";

#[derive(Clone, Debug)]
pub struct GoogleConfig {
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
    authorize_url: String,
    token_url: String,
}

impl GoogleConfig {
    #[must_use]
    pub fn new(client_id: String, client_secret: SecretString, frontend_base_url: &str) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri: format!(
                "{}{CALLBACK_PATH}",
                frontend_base_url.trim_end_matches('/')
            ),
            authorize_url: AUTHORIZE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_authorize_url(mut self, url: String) -> Self {
        self.authorize_url = url;
        self
    }

    #[must_use]
    pub fn with_token_url(mut self, url: String) -> Self {
        self.token_url = url;
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }
}

/// Verified identity from Google's `id_token`.
#[derive(Clone, Debug)]
pub struct GoogleIdentity {
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
    pub id_token: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    id_token: Option<String>,
}

#[derive(Deserialize)]
struct IdClaims {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
}

pub struct GoogleOAuth {
    config: GoogleConfig,
    http: Client,
    states: Mutex<HashMap<String, Instant>>,
}

impl GoogleOAuth {
    #[must_use]
    pub fn new(config: GoogleConfig, http: Client) -> Self {
        Self {
            config,
            http,
            states: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    /// Authorization URL with a fresh `state` nonce.
    ///
    /// # Errors
    /// `BackendUnavailable` if the configured authorize endpoint is not a URL.
    pub async fn authorize_url(&self) -> Result<String, AuthError> {
        let state = Ulid::new().to_string();
        let url = Url::parse_with_params(
            &self.config.authorize_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state.as_str()),
                ("prompt", "select_account"),
            ],
        )
        .map_err(AuthError::backend)?;

        let mut states = self.states.lock().await;
        states.retain(|_, issued| issued.elapsed() < STATE_TTL);
        states.insert(state, Instant::now());

        Ok(url.into())
    }

    /// Consume a `state` nonce; `false` if unknown, reused or expired.
    pub async fn take_state(&self, state: &str) -> bool {
        self.states
            .lock()
            .await
            .remove(state)
            .is_some_and(|issued| issued.elapsed() < STATE_TTL)
    }

    /// Exchange the authorization code and read the identity from the `id_token`.
    ///
    /// # Errors
    /// `InvalidCredentials` if Google rejects the code or the email is not
    /// verified, `BackendUnavailable` on transport failure.
    pub async fn exchange_code(&self, code: &str) -> Result<GoogleIdentity, AuthError> {
        let span = info_span!(
            "google.token",
            http.method = "POST",
            url = %self.config.token_url
        );
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.expose_secret()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .instrument(span)
            .await
            .map_err(AuthError::backend)?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "google token exchange rejected");
            return Err(AuthError::InvalidCredentials(
                "Google sign-in failed".to_string(),
            ));
        }

        let TokenResponse { id_token } = response.json().await.map_err(AuthError::backend)?;
        let id_token =
            id_token.ok_or_else(|| AuthError::backend("id_token missing from Google response"))?;
        identity_from_id_token(id_token)
    }
}

/// The token comes straight from Google over TLS, so its claims are read without
/// re-verifying the signature.
fn identity_from_id_token(id_token: String) -> Result<GoogleIdentity, AuthError> {
    let claims: IdClaims = decode_claims(&id_token)
        .map_err(|err| AuthError::backend(format!("invalid id_token: {err}")))?;
    let Some(email) = claims.email.filter(|email| !email.is_empty()) else {
        return Err(AuthError::InvalidCredentials(
            "Google account has no email".to_string(),
        ));
    };
    if claims.email_verified != Some(true) {
        return Err(AuthError::InvalidCredentials(
            "Google email is not verified".to_string(),
        ));
    }
    Ok(GoogleIdentity {
        subject: claims.sub,
        email,
        name: claims.name,
        id_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use base64ct::{Base64UrlUnpadded, Encoding};

    fn oauth() -> GoogleOAuth {
        let config = GoogleConfig::new(
            "client-123".to_string(),
            SecretString::from("shh"),
            "https://portal.campus.edu/",
        );
        GoogleOAuth::new(config, Client::new())
    }

    fn id_token(claims: &str) -> String {
        format!(
            "e30.{}.sig",
            Base64UrlUnpadded::encode_string(claims.as_bytes())
        )
    }

    #[test]
    fn redirect_uri_points_at_callback() {
        assert_eq!(
            oauth().config().redirect_uri(),
            "https://portal.campus.edu/api/auth/callback/google"
        );
    }

    #[tokio::test]
    async fn authorize_url_carries_a_single_use_state() -> Result<()> {
        let oauth = oauth();
        let url = Url::parse(&oauth.authorize_url().await?)?;
        assert_eq!(url.host_str(), Some("accounts.google.com"));

        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(params.get("client_id").map(String::as_str), Some("client-123"));
        assert_eq!(params.get("response_type").map(String::as_str), Some("code"));
        let state = params.get("state").cloned().unwrap_or_default();

        assert!(oauth.take_state(&state).await);
        assert!(!oauth.take_state(&state).await);
        assert!(!oauth.take_state("forged").await);
        Ok(())
    }

    #[test]
    fn identity_is_read_from_claims() -> Result<()> {
        let token = id_token(
            r#"{"sub":"1089","email":"alan@campus.edu","email_verified":true,"name":"Alan"}"#,
        );
        let identity = identity_from_id_token(token.clone())?;
        assert_eq!(identity.subject, "1089");
        assert_eq!(identity.email, "alan@campus.edu");
        assert_eq!(identity.name.as_deref(), Some("Alan"));
        assert_eq!(identity.id_token, token);
        Ok(())
    }

    #[test]
    fn unverified_or_missing_email_is_rejected() {
        let unverified = id_token(r#"{"sub":"1","email":"a@b.c","email_verified":false}"#);
        assert!(matches!(
            identity_from_id_token(unverified),
            Err(AuthError::InvalidCredentials(_))
        ));
        let unclaimed = id_token(r#"{"sub":"1","email":"a@b.c"}"#);
        assert!(matches!(
            identity_from_id_token(unclaimed),
            Err(AuthError::InvalidCredentials(_))
        ));
        let missing = id_token(r#"{"sub":"1"}"#);
        assert!(matches!(
            identity_from_id_token(missing),
            Err(AuthError::InvalidCredentials(_))
        ));
    }
}
