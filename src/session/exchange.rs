//! Credential exchange: turn a password login or a Google identity into a session.

use super::{
    model::{Identity, Session},
    role::Role,
    token::{TokenPair, now_ms},
};
use crate::{
    backend::{BackendClient, auth::LoginGrant, google::GoogleIdentity},
    error::AuthError,
};
use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, instrument};

/// Exchange email and password for a backend-issued session.
///
/// # Errors
/// `InvalidCredentials` with the backend's detail message on a rejected login,
/// `BackendUnavailable` when the backend cannot be reached or answers garbage.
#[instrument(skip(backend, password))]
pub async fn password(
    backend: &BackendClient,
    email: &str,
    password: &SecretString,
) -> Result<Session, AuthError> {
    let grant = backend.login(email, password).await?;
    password_session(email, grant)
}

/// Build a session for a verified Google identity. The role comes from the
/// backend's check-user lookup and defaults to student.
pub async fn federated(backend: &BackendClient, google: GoogleIdentity) -> Session {
    let role = backend.check_user(&google.email).await.unwrap_or(Role::Student);
    federated_session(google, role, now_ms())
}

pub(crate) fn password_session(email: &str, grant: LoginGrant) -> Result<Session, AuthError> {
    let LoginGrant {
        access,
        refresh,
        role,
        username,
        id,
    } = grant;
    let (Some(access), Some(refresh)) = (access, refresh) else {
        return Err(AuthError::backend("Token not returned from backend"));
    };
    let tokens = TokenPair::from_backend(access, Some(refresh))
        .map_err(|err| AuthError::backend(format!("invalid access token: {err}")))?;

    // An unknown role string leaves the session without a role.
    let role = role.as_deref().map_or(Some(Role::Student), Role::parse);
    debug!(?role, "login accepted");

    let identity = Identity {
        user_id: id.as_ref().and_then(id_string).unwrap_or_else(|| email.to_string()),
        display_name: username.unwrap_or_else(|| local_part(email).to_string()),
        email: email.to_string(),
        role,
    };
    Ok(Session::new(identity, tokens, false))
}

pub(crate) fn federated_session(google: GoogleIdentity, role: Role, now_ms: i64) -> Session {
    let GoogleIdentity {
        subject,
        email,
        name,
        id_token,
    } = google;
    let display_name = name.unwrap_or_else(|| local_part(&email).to_string());
    let identity = Identity {
        user_id: subject,
        display_name,
        email,
        role: Some(role),
    };
    Session::new(identity, TokenPair::federated(id_token, now_ms), true)
}

fn id_string(id: &Value) -> Option<String> {
    match id {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}
