use crate::{
    api::{
        self,
        state::{AppState, GatewayConfig},
    },
    backend::{
        BackendClient, BackendConfig,
        google::{GoogleConfig, GoogleOAuth},
    },
    session::MemorySessionStore,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::{debug, info};

pub struct Args {
    pub port: u16,
    pub api_url: String,
    pub ws_url: String,
    pub frontend_base_url: String,
    pub pages_dir: PathBuf,
    pub request_timeout_seconds: u64,
    pub session_ttl_seconds: i64,
    pub max_upload_mb: usize,
    pub google: Option<GoogleCredentials>,
}

pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("port", &self.port)
            .field("api_url", &self.api_url)
            .field("ws_url", &self.ws_url)
            .field("frontend_base_url", &self.frontend_base_url)
            .field("pages_dir", &self.pages_dir)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("max_upload_mb", &self.max_upload_mb)
            .field(
                "google_client_id",
                &self.google.as_ref().map(|google| google.client_id.as_str()),
            )
            .finish()
    }
}

/// Build the gateway state from validated arguments.
///
/// # Errors
/// Returns an error if the backend URL is invalid or the HTTP client cannot be built.
pub fn build_state(args: Args) -> Result<AppState> {
    let backend_config = BackendConfig::new(&args.api_url)
        .context("Invalid backend API URL")?
        .with_timeout(Duration::from_secs(args.request_timeout_seconds));
    let backend = BackendClient::new(backend_config)?;

    let config = GatewayConfig::new(args.frontend_base_url.clone())
        .with_ws_url(args.ws_url)
        .with_pages_dir(args.pages_dir)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_max_upload_bytes(args.max_upload_mb.saturating_mul(1024 * 1024));

    let ttl = Duration::from_secs(u64::try_from(args.session_ttl_seconds).unwrap_or_default());
    let store = Arc::new(MemorySessionStore::new(ttl));

    let mut state = AppState::new(config, backend.clone(), store);
    if let Some(google) = args.google {
        let google_config =
            GoogleConfig::new(google.client_id, google.client_secret, &args.frontend_base_url);
        info!(redirect_uri = google_config.redirect_uri(), "Google sign-in enabled");
        state = state.with_oauth(GoogleOAuth::new(google_config, backend.http().clone()));
    }
    Ok(state)
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);
    let port = args.port;
    let state = build_state(args)?;
    api::new(port, Arc::new(state)).await
}
