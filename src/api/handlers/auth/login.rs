use super::{
    start_session,
    types::{ErrorResponse, LoginRequest},
};
use crate::{
    api::state::AppState,
    session::{SessionView, exchange},
};
use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, instrument};

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session created, cookie set", body = SessionView),
        (status = 400, description = "Missing email or password", body = ErrorResponse),
        (status = 401, description = "Backend rejected the credentials", body = ErrorResponse),
        (status = 502, description = "Backend unavailable", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip(headers, state, payload))]
pub async fn login(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing payload" })),
        )
            .into_response();
    };

    let email = request.email.trim();
    if email.is_empty() || request.password.expose_secret().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Please enter email and password" })),
        )
            .into_response();
    }

    let session = match exchange::password(state.backend(), email, &request.password).await {
        Ok(session) => session,
        Err(err) => {
            info!("login failed: {err}");
            return err.into_response();
        }
    };

    let view = session.view();
    match start_session(&state, &headers, session).await {
        Ok(cookie) => (StatusCode::OK, [(SET_COOKIE, cookie)], Json(view)).into_response(),
        Err(err) => {
            error!("Failed to build session cookie: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
