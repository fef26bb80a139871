//! Session projection and sign-out.

use super::{
    cookie::{clear_session_cookie, extract_session_token},
    end_session,
};
use crate::{api::state::AppState, guard::LOGIN_PATH, session::SessionView};
use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Session is active, or carries an error that requires sign-in", body = SessionView),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn session(headers: HeaderMap, state: Extension<Arc<AppState>>) -> Response {
    let Some(id) = extract_session_token(&headers) else {
        return StatusCode::NO_CONTENT.into_response();
    };
    // Runs the lazy refresh; on failure the stored session (with its error) is still reported.
    let session = match state.tokens().current(&id).await {
        Ok(session) => Some(session),
        Err(_) => state.store().get(&id).await,
    };
    match session {
        Some(session) => (StatusCode::OK, Json(session.view())).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
pub async fn logout(headers: HeaderMap, state: Extension<Arc<AppState>>) -> Response {
    sign_out(&headers, &state).await;
    // Always clear the cookie, even if the session was already gone.
    let mut response = StatusCode::NO_CONTENT.into_response();
    if let Ok(cookie) = clear_session_cookie(state.config()) {
        response.headers_mut().insert(SET_COOKIE, cookie);
    }
    response
}

/// Browser sign-out link: clears the session and lands on the login page.
pub async fn logout_page(headers: HeaderMap, state: Extension<Arc<AppState>>) -> Response {
    sign_out(&headers, &state).await;
    let mut response = Redirect::to(LOGIN_PATH).into_response();
    if let Ok(cookie) = clear_session_cookie(state.config()) {
        response.headers_mut().insert(SET_COOKIE, cookie);
    }
    response
}

async fn sign_out(headers: &HeaderMap, state: &AppState) {
    if let Some(id) = extract_session_token(headers) {
        end_session(state, &id).await;
    }
}
