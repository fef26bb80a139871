//! Shared gateway state handed to every handler through an `Extension`.

use crate::{
    backend::{BackendClient, google::GoogleOAuth},
    session::{SessionStore, TokenManager},
};
use std::{path::PathBuf, sync::Arc};

const DEFAULT_SESSION_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 500 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    frontend_base_url: String,
    ws_url: String,
    pages_dir: PathBuf,
    session_ttl_seconds: i64,
    max_upload_bytes: usize,
}

impl GatewayConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            ws_url: "ws://127.0.0.1:8000/ws".to_string(),
            pages_dir: PathBuf::from("./public"),
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    #[must_use]
    pub fn with_ws_url(mut self, ws_url: String) -> Self {
        self.ws_url = ws_url;
        self
    }

    #[must_use]
    pub fn with_pages_dir(mut self, pages_dir: PathBuf) -> Self {
        self.pages_dir = pages_dir;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    #[must_use]
    pub fn pages_dir(&self) -> &PathBuf {
        &self.pages_dir
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Only mark cookies secure when the frontend is served over HTTPS.
    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

pub struct AppState {
    config: GatewayConfig,
    backend: BackendClient,
    tokens: TokenManager,
    oauth: Option<GoogleOAuth>,
}

impl AppState {
    #[must_use]
    pub fn new(config: GatewayConfig, backend: BackendClient, store: Arc<dyn SessionStore>) -> Self {
        let tokens = TokenManager::new(store, Arc::new(backend.clone()));
        Self {
            config,
            backend,
            tokens,
            oauth: None,
        }
    }

    #[must_use]
    pub fn with_oauth(mut self, oauth: GoogleOAuth) -> Self {
        self.oauth = Some(oauth);
        self
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        self.tokens.store()
    }

    #[must_use]
    pub fn oauth(&self) -> Option<&GoogleOAuth> {
        self.oauth.as_ref()
    }
}
