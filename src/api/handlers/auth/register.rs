use super::{
    types::{ErrorResponse, RegisterRequest},
    valid_email,
};
use crate::{
    api::{handlers::proxy::relay, state::AppState},
    session::token::now_ms,
};
use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, instrument};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created by the backend"),
        (status = 400, description = "Invalid form, or rejected by the backend", body = ErrorResponse),
        (status = 502, description = "Backend unavailable", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip(state, payload))]
pub async fn register(
    state: Extension<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_request(&rejection.body_text()),
    };

    if request.name.trim().is_empty() {
        return bad_request("Name is required");
    }
    if !valid_email(request.email.trim()) {
        return bad_request("Invalid email");
    }
    if request.password.is_empty() {
        return bad_request("Password is required");
    }
    if request.password != request.confirm_password {
        return bad_request("Passwords do not match");
    }

    let payload = request.into_backend(now_ms());
    debug!(username = %payload.username, role = %payload.role, "registering account");

    match state.backend().register(&payload).await {
        Ok(response) => relay(response, None).await,
        Err(err) => err.into_response(),
    }
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}
