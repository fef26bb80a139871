//! Authenticated pass-through to the backend API.
//!
//! Every proxy resolves the caller's session first (refreshing its token if
//! needed), attaches `Authorization: Bearer <access token>` and relays the
//! backend's status, body and content type. A transport timeout is retried
//! once; nothing else is.

pub mod chat;
pub mod faculty;
pub mod mapping;
pub mod multipart;
pub mod quizzes;
pub mod student;

use self::multipart::RelayPart;
use super::auth::cookie::extract_session_token;
use crate::{api::state::AppState, error::AuthError};
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderMap, Method, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{Instrument, debug, info_span, warn};

/// A caller with a live session, ready to talk to the backend on its behalf.
pub(crate) struct Upstream<'a> {
    state: &'a AppState,
    access_token: SecretString,
}

impl<'a> Upstream<'a> {
    /// Resolve the session behind `headers`; answers `401 {error}` when there is none.
    pub(crate) async fn authorize(state: &'a AppState, headers: &HeaderMap) -> Result<Self, Response> {
        let id = extract_session_token(headers).ok_or_else(unauthorized)?;
        let session = state
            .tokens()
            .current(&id)
            .await
            .map_err(IntoResponse::into_response)?;
        let access_token = session.tokens().access_token().clone();
        if access_token.expose_secret().is_empty() {
            return Err(unauthorized());
        }
        Ok(Self {
            state,
            access_token,
        })
    }

    fn request(&self, method: &Method, url: &str) -> RequestBuilder {
        self.state
            .backend()
            .http()
            .request(method.clone(), url)
            .bearer_auth(self.access_token.expose_secret())
    }

    /// Forward without a body; `path` is relative to the API base.
    pub(crate) async fn forward(&self, method: Method, path: &str, success: Option<StatusCode>) -> Response {
        let url = self.state.backend().config().api_endpoint(path);
        match dispatch(&method, &url, || self.request(&method, &url)).await {
            Ok(response) => relay(response, success).await,
            Err(err) => err.into_response(),
        }
    }

    pub(crate) async fn forward_json<T: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: &T,
        success: Option<StatusCode>,
    ) -> Response {
        let url = self.state.backend().config().api_endpoint(path);
        match dispatch(&method, &url, || self.request(&method, &url).json(body)).await {
            Ok(response) => relay(response, success).await,
            Err(err) => err.into_response(),
        }
    }

    /// Forward a rebuilt multipart form; reqwest writes the content type and boundary.
    pub(crate) async fn forward_form(
        &self,
        method: Method,
        path: &str,
        parts: &[RelayPart],
        success: Option<StatusCode>,
    ) -> Response {
        let url = self.state.backend().config().api_endpoint(path);
        let result = dispatch(&method, &url, || {
            self.request(&method, &url)
                .multipart(multipart::build_form(parts))
        })
        .await;
        match result {
            Ok(response) => relay(response, success).await,
            Err(err) => err.into_response(),
        }
    }

    /// Like [`Upstream::forward_json`] but replaces a successful body with `message`.
    pub(crate) async fn forward_json_with_message<T: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: &T,
        message: &str,
    ) -> Response {
        let url = self.state.backend().config().api_endpoint(path);
        match dispatch(&method, &url, || self.request(&method, &url).json(body)).await {
            Ok(response) if response.status().is_success() => {
                (StatusCode::OK, Json(json!({ "message": message }))).into_response()
            }
            Ok(response) => relay(response, None).await,
            Err(err) => err.into_response(),
        }
    }
}

/// Send once, and once more if the first attempt timed out.
pub(crate) async fn dispatch<F>(
    method: &Method,
    url: &str,
    build: F,
) -> Result<reqwest::Response, AuthError>
where
    F: Fn() -> RequestBuilder,
{
    let span = info_span!("backend.proxy", http.method = %method, url = %url);
    async {
        match build().send().await {
            Ok(response) => Ok(response),
            Err(err) if err.is_timeout() => {
                warn!("backend request timed out, retrying once");
                build().send().await.map_err(AuthError::backend)
            }
            Err(err) => Err(AuthError::backend(err)),
        }
    }
    .instrument(span)
    .await
}

/// Relay status, body and content type; `success` overrides a 2xx status.
pub(crate) async fn relay(response: reqwest::Response, success: Option<StatusCode>) -> Response {
    let status = response.status();
    let content_type = response.headers().get(CONTENT_TYPE).cloned();
    let body = match response.bytes().await {
        Ok(body) => body,
        Err(err) => return AuthError::backend(err).into_response(),
    };

    let status = match success {
        Some(success) if status.is_success() => success,
        _ => status,
    };
    if !status.is_success() {
        debug!(%status, "backend returned an error");
    }
    if status == StatusCode::NO_CONTENT {
        return StatusCode::NO_CONTENT.into_response();
    }

    let mut relayed = (status, body).into_response();
    if let Some(content_type) = content_type {
        relayed.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    relayed
}

/// Client JSON body, or `400 {error}` when it is missing or malformed.
pub(crate) fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, Response> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": rejection.body_text() })),
        )
            .into_response()
    })
}

fn unauthorized() -> Response {
    AuthError::Unauthorized.into_response()
}
