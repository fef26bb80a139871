//! Outbound client for the campus backend API.

pub mod auth;
pub mod google;

use crate::{APP_USER_AGENT, error::AuthError};
use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use std::time::Duration;
use tracing::{Instrument, debug, info_span};
use url::Url;

const DEFAULT_TIMEOUT_SECONDS: u64 = 20;

#[derive(Clone, Debug)]
pub struct BackendConfig {
    api_url: String,
    auth_root: String,
    timeout: Duration,
}

impl BackendConfig {
    /// Derive the API base and the auth root (API base without its `/api` suffix).
    ///
    /// # Errors
    /// Returns an error if `api_url` is not an absolute http(s) URL.
    pub fn new(api_url: &str) -> Result<Self> {
        let parsed =
            Url::parse(api_url).with_context(|| format!("Invalid backend API URL: {api_url}"))?;
        match parsed.scheme() {
            "http" | "https" => {}
            scheme => return Err(anyhow!("Unsupported backend URL scheme: {scheme}")),
        }
        if parsed.host_str().is_none() {
            return Err(anyhow!("Backend API URL must include a host: {api_url}"));
        }

        let api_url = api_url.trim_end_matches('/').to_string();
        let auth_root = api_url
            .strip_suffix("/api")
            .unwrap_or(&api_url)
            .to_string();

        debug!(api_url, auth_root, "backend endpoints");

        Ok(Self {
            api_url,
            auth_root,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    #[must_use]
    pub fn auth_root(&self) -> &str {
        &self.auth_root
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `path` must start with `/`.
    #[must_use]
    pub fn api_endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }

    #[must_use]
    pub fn auth_endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.auth_root)
    }
}

/// Shared reqwest client plus the backend endpoints it talks to.
#[derive(Clone, Debug)]
pub struct BackendClient {
    http: Client,
    config: BackendConfig,
}

impl BackendClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .user_agent(APP_USER_AGENT)
            .timeout(config.timeout())
            .build()
            .context("Failed to build backend HTTP client")?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub fn http(&self) -> &Client {
        &self.http
    }

    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Reachability probe; any HTTP answer counts as up.
    ///
    /// # Errors
    /// `BackendUnavailable` on connection failure or timeout.
    pub async fn ping(&self) -> Result<(), AuthError> {
        let url = self.config.auth_endpoint("/");
        let span = info_span!("backend.ping", http.method = "GET", url = %url);
        self.http
            .get(&url)
            .send()
            .instrument(span)
            .await
            .map(|_| ())
            .map_err(AuthError::backend)
    }
}

/// Best-effort human message from a backend error body.
pub(crate) fn error_detail(body: &serde_json::Value) -> Option<String> {
    ["detail", "error", "message"]
        .iter()
        .find_map(|key| body.get(key).and_then(serde_json::Value::as_str))
        .map(ToString::to_string)
}
