//! Route handlers for the gateway.
//!
//! `auth` owns sessions and cookies, `proxy` forwards API calls to the backend
//! and `guard` is the middleware in front of the static pages.

pub mod auth;
pub mod config;
pub mod guard;
pub mod health;
pub mod proxy;

use axum::{
    Json,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Unknown `/api` paths answer JSON instead of falling through to the pages.
pub async fn api_not_found(uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("No route for {}", uri.path()) })),
    )
        .into_response()
}
