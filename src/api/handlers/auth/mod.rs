//! Credential exchange endpoints and the session cookie.
//!
//! Sessions are created by password login or the Google callback and always
//! handed to the browser as an opaque `HttpOnly` cookie. Tokens stay here.

pub mod cookie;
pub mod login;
pub mod oauth;
pub mod register;
pub mod session;
pub mod types;

use crate::{
    api::state::AppState,
    session::Session,
};
use axum::http::{HeaderMap, HeaderValue, header::InvalidHeaderValue};
use regex::Regex;
use tracing::debug;

/// Store a freshly exchanged session, drop the one it replaces and build its cookie.
pub(crate) async fn start_session(
    state: &AppState,
    previous: &HeaderMap,
    session: Session,
) -> Result<HeaderValue, InvalidHeaderValue> {
    if let Some(old) = cookie::extract_session_token(previous) {
        end_session(state, &old).await;
    }
    let cookie = cookie::session_cookie(state.config(), session.id())?;
    debug!(role = ?session.role(), federated = session.is_federated(), "session started");
    state.store().insert(session).await;
    Ok(cookie)
}

pub(crate) async fn end_session(state: &AppState, session_id: &str) {
    if state.store().clear(session_id).await.is_some() {
        debug!("session cleared");
    }
    state.tokens().forget(session_id).await;
}

pub(crate) fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@campus.edu"));
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("a b@campus.edu"));
    }
}
