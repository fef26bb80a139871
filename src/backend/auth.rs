//! Backend auth endpoints: login, token refresh, check-user and register.
//!
//! None of these calls are retried. A failed credential exchange is reported
//! to the caller as-is.

use super::{BackendClient, error_detail};
use crate::{
    error::AuthError,
    session::{RefreshGrant, Role, TokenRefresher},
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{Instrument, debug, info_span, warn};

/// Login response. Tokens are optional here so a malformed answer can be
/// reported as a backend failure rather than a parse error.
#[derive(Debug, Deserialize)]
pub struct LoginGrant {
    pub access: Option<String>,
    pub refresh: Option<String>,
    pub role: Option<String>,
    pub username: Option<String>,
    pub id: Option<Value>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    refresh: Option<String>,
}

#[derive(Deserialize)]
struct CheckUserResponse {
    #[serde(default)]
    exists: bool,
    role: Option<String>,
}

impl BackendClient {
    /// `POST {root}/auth/login/`
    ///
    /// # Errors
    /// `InvalidCredentials` on any non-2xx answer, `BackendUnavailable` on
    /// transport failure or an unreadable body.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<LoginGrant, AuthError> {
        let url = self.config.auth_endpoint("/auth/login/");
        let span = info_span!("backend.login", http.method = "POST", url = %url);
        let response = self
            .http
            .post(&url)
            .json(&json!({ "email": email, "password": password.expose_secret() }))
            .send()
            .instrument(span)
            .await
            .map_err(AuthError::backend)?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let detail = error_detail(&body).unwrap_or_else(|| "Invalid credentials".to_string());
            debug!(%status, "login rejected");
            return Err(AuthError::InvalidCredentials(detail));
        }

        response.json().await.map_err(AuthError::backend)
    }

    /// `POST {root}/auth/check-user/`; any failure yields `None`.
    pub async fn check_user(&self, email: &str) -> Option<Role> {
        let url = self.config.auth_endpoint("/auth/check-user/");
        let span = info_span!("backend.check_user", http.method = "POST", url = %url);
        let response = match self
            .http
            .post(&url)
            .json(&json!({ "email": email }))
            .send()
            .instrument(span)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!("Role check failed, using default role: {err}");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(status = %response.status(), "check-user returned no role");
            return None;
        }

        match response.json::<CheckUserResponse>().await {
            Ok(CheckUserResponse {
                exists: true,
                role: Some(role),
            }) => Role::parse(&role),
            Ok(_) => None,
            Err(err) => {
                warn!("Failed to parse check-user response: {err}");
                None
            }
        }
    }

    /// `POST {root}/auth/register/`; the response is relayed by the caller.
    ///
    /// # Errors
    /// `BackendUnavailable` on transport failure.
    pub async fn register<T: Serialize + Sync>(
        &self,
        payload: &T,
    ) -> Result<reqwest::Response, AuthError> {
        let url = self.config.auth_endpoint("/auth/register/");
        let span = info_span!("backend.register", http.method = "POST", url = %url);
        self.http
            .post(&url)
            .json(payload)
            .send()
            .instrument(span)
            .await
            .map_err(AuthError::backend)
    }
}

#[async_trait]
impl TokenRefresher for BackendClient {
    /// `POST {root}/auth/token/refresh/`
    async fn refresh(&self, refresh_token: &SecretString) -> Result<RefreshGrant, AuthError> {
        let url = self.config.auth_endpoint("/auth/token/refresh/");
        let span = info_span!("backend.refresh", http.method = "POST", url = %url);
        let response = self
            .http
            .post(&url)
            .json(&json!({ "refresh": refresh_token.expose_secret() }))
            .send()
            .instrument(span)
            .await
            .map_err(AuthError::backend)?;

        let status = response.status();
        if status.is_client_error() {
            return Err(AuthError::RefreshTokenExpired);
        }
        if !status.is_success() {
            return Err(AuthError::backend(format!("refresh returned {status}")));
        }

        let RefreshResponse { access, refresh } =
            response.json().await.map_err(AuthError::backend)?;
        Ok(RefreshGrant { access, refresh })
    }
}
