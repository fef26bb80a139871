use super::{Upstream, faculty::read_form};
use crate::api::{handlers::auth::types::ErrorResponse, state::AppState};
use axum::{
    extract::{Extension, Multipart},
    http::{HeaderMap, Method, StatusCode},
    response::Response,
};
use std::sync::Arc;

const NOTES: &str = "/student/notes/";

#[utoipa::path(
    get,
    path = "/api/notes",
    responses(
        (status = 200, description = "Notes of the signed-in student"),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "student"
)]
pub async fn list_notes(headers: HeaderMap, state: Extension<Arc<AppState>>) -> Response {
    match Upstream::authorize(&state, &headers).await {
        Ok(upstream) => upstream.forward(Method::GET, NOTES, None).await,
        Err(response) => response,
    }
}

#[utoipa::path(
    post,
    path = "/api/notes",
    responses(
        (status = 201, description = "Note uploaded (multipart form, relayed unchanged)"),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "student"
)]
pub async fn upload_note(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    form: Multipart,
) -> Response {
    let upstream = match Upstream::authorize(&state, &headers).await {
        Ok(upstream) => upstream,
        Err(response) => return response,
    };
    match read_form(form).await {
        Ok(parts) => {
            upstream
                .forward_form(Method::POST, NOTES, &parts, Some(StatusCode::CREATED))
                .await
        }
        Err(response) => response,
    }
}
