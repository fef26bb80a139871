//! Google sign-in. The callback lives under `/api/auth`, which the route guard never intercepts.

use super::{start_session, types::OAuthCallback};
use crate::{
    api::state::AppState,
    guard::LOGIN_PATH,
    session::exchange,
};
use axum::{
    Json,
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

const CALLBACK_ERROR: &str = "/auth/login?error=OAuthCallback";

#[utoipa::path(
    get,
    path = "/api/auth/signin/google",
    responses(
        (status = 303, description = "Redirect to Google"),
        (status = 404, description = "Federated login is not configured")
    ),
    tag = "auth"
)]
pub async fn signin(state: Extension<Arc<AppState>>) -> Response {
    let Some(oauth) = state.oauth() else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Federated login is not configured" })),
        )
            .into_response();
    };
    match oauth.authorize_url().await {
        Ok(url) => Redirect::to(&url).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/callback/google",
    params(
        ("code" = Option<String>, Query, description = "Authorization code"),
        ("state" = Option<String>, Query, description = "Nonce issued by the sign-in redirect")
    ),
    responses(
        (status = 303, description = "Session created, redirect to the role dashboard; or back to login on failure"),
        (status = 404, description = "Federated login is not configured")
    ),
    tag = "auth"
)]
pub async fn callback(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    Query(query): Query<OAuthCallback>,
) -> Response {
    let Some(oauth) = state.oauth() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if let Some(reason) = query.error.as_deref() {
        info!("Google sign-in cancelled: {reason}");
        return Redirect::to(CALLBACK_ERROR).into_response();
    }
    let (Some(code), Some(nonce)) = (query.code.as_deref(), query.state.as_deref()) else {
        return Redirect::to(CALLBACK_ERROR).into_response();
    };
    if !oauth.take_state(nonce).await {
        warn!("OAuth callback with unknown or expired state");
        return Redirect::to(CALLBACK_ERROR).into_response();
    }

    let identity = match oauth.exchange_code(code).await {
        Ok(identity) => identity,
        Err(err) => {
            warn!("Google code exchange failed: {err}");
            return Redirect::to(CALLBACK_ERROR).into_response();
        }
    };

    let session = exchange::federated(state.backend(), identity).await;
    let target = session.role().map_or(LOGIN_PATH, |role| role.dashboard());
    match start_session(&state, &headers, session).await {
        Ok(cookie) => {
            let mut response = Redirect::to(target).into_response();
            response.headers_mut().insert(SET_COOKIE, cookie);
            response
        }
        Err(err) => {
            error!("Failed to build session cookie: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
