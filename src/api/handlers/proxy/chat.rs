use super::{Upstream, json_body, mapping::CHAT};
use crate::api::{handlers::auth::types::ErrorResponse, state::AppState};
use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, Method},
    response::Response,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize)]
pub struct ChatMessage {
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatMessage,
    responses(
        (status = 200, description = "Assistant reply"),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "chat"
)]
pub async fn chat(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let upstream = match Upstream::authorize(&state, &headers).await {
        Ok(upstream) => upstream,
        Err(response) => return response,
    };
    match json_body(payload) {
        Ok(body) => {
            let body = CHAT.apply_json(body);
            upstream
                .forward_json(Method::POST, CHAT.endpoint, &body, None)
                .await
        }
        Err(response) => response,
    }
}
