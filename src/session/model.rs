use super::{
    role::Role,
    token::{TokenPair, TokenState},
};
use crate::error::AuthError;
use serde::{Deserialize, Serialize};
use ulid::Ulid;
use utoipa::ToSchema;

/// Failure recorded on a session instead of being thrown; forces re-authentication.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SessionError {
    RefreshTokenExpired,
    NoRefreshToken,
}

impl From<SessionError> for AuthError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::RefreshTokenExpired => Self::RefreshTokenExpired,
            SessionError::NoRefreshToken => Self::NoRefreshToken,
        }
    }
}

/// Who the session belongs to. Immutable once the session exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub display_name: String,
    pub email: String,
    pub role: Option<Role>,
}

#[derive(Clone, Debug)]
pub struct Session {
    id: String,
    identity: Identity,
    tokens: TokenPair,
    federated: bool,
    error: Option<SessionError>,
}

impl Session {
    #[must_use]
    pub fn new(identity: Identity, tokens: TokenPair, federated: bool) -> Self {
        Self {
            id: Ulid::new().to_string(),
            identity,
            tokens,
            federated,
            error: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.identity.role
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenPair {
        &self.tokens
    }

    #[must_use]
    pub fn is_federated(&self) -> bool {
        self.federated
    }

    #[must_use]
    pub fn error(&self) -> Option<SessionError> {
        self.error
    }

    /// Token state at `now_ms`; a sticky error always wins over the clock.
    #[must_use]
    pub fn token_state(&self, now_ms: i64) -> TokenState {
        if self.error.is_some() {
            TokenState::Invalid
        } else {
            self.tokens.state(now_ms)
        }
    }

    pub(super) fn set_tokens(&mut self, tokens: TokenPair) {
        self.tokens = tokens;
        self.error = None;
    }

    pub(super) fn set_error(&mut self, error: SessionError) {
        self.error = Some(error);
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView {
            user_id: self.identity.user_id.clone(),
            name: self.identity.display_name.clone(),
            email: self.identity.email.clone(),
            role: self.identity.role,
            access_token_expires_at: self.tokens.expires_at_ms(),
            federated: self.federated,
            error: self.error,
        }
    }
}

/// Read-only projection handed to the browser. Tokens never leave the gateway.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: Option<Role>,
    pub access_token_expires_at: i64,
    pub federated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SessionError>,
}
