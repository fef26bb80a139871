//! Failure taxonomy shared by credential exchange, token refresh and proxies.
//!
//! Nothing here is fatal to the process: every variant resolves to a redirect
//! (guard) or a JSON `{ "error": ... }` body (API handlers).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Bad login; carries the backend-provided detail message.
    #[error("{0}")]
    InvalidCredentials(String),
    /// The backend rejected the refresh token (expired or revoked).
    #[error("Refresh token expired")]
    RefreshTokenExpired,
    /// The access token expired and the session has nothing to refresh with.
    #[error("Session expired, sign in again")]
    NoRefreshToken,
    /// Network failure, timeout, 5xx or a response that could not be parsed.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),
    /// No valid session for a call that needs one.
    #[error("Unauthorized")]
    Unauthorized,
}

impl AuthError {
    pub(crate) fn backend(reason: impl std::fmt::Display) -> Self {
        Self::BackendUnavailable(reason.to_string())
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials(_)
            | Self::RefreshTokenExpired
            | Self::NoRefreshToken
            | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BackendUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Only backend outages are safe to retry; every other failure is final.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::body::to_bytes;

    #[test]
    fn status_mapping() {
        assert_eq!(
            AuthError::InvalidCredentials("nope".to_string()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::RefreshTokenExpired.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::backend("connection refused").status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn only_backend_failures_are_transient() {
        assert!(AuthError::backend("timeout").is_transient());
        assert!(!AuthError::Unauthorized.is_transient());
        assert!(!AuthError::NoRefreshToken.is_transient());
        assert!(!AuthError::InvalidCredentials(String::new()).is_transient());
    }

    #[tokio::test]
    async fn unauthorized_renders_error_object() -> Result<()> {
        let response = AuthError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(value, json!({ "error": "Unauthorized" }));
        Ok(())
    }
}
