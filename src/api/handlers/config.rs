use super::auth::types::PublicConfig;
use crate::api::state::AppState;
use axum::{Json, extract::Extension};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/config",
    responses(
        (status = 200, description = "Public runtime configuration for the portal", body = PublicConfig)
    ),
    tag = "config"
)]
pub async fn config(state: Extension<Arc<AppState>>) -> Json<PublicConfig> {
    Json(PublicConfig {
        api_url: state.backend().config().api_url().to_string(),
        ws_url: state.config().ws_url().to_string(),
        federated_login: state.oauth().is_some(),
    })
}
