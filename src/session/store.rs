//! Session storage contract and the in-memory implementation.

use super::{
    model::{Session, SessionError},
    token::TokenPair,
};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;
use tracing::debug;

/// Where sessions live. Every token mutation goes through [`SessionStore::replace`]
/// so readers never see a new access token paired with an old expiry.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, id: &str) -> Option<Session>;

    async fn insert(&self, session: Session);

    /// Swap the token pair and clear any recorded error. Returns `false` if the
    /// session no longer exists.
    async fn replace(&self, id: &str, tokens: TokenPair) -> bool;

    async fn mark_error(&self, id: &str, error: SessionError) -> bool;

    async fn clear(&self, id: &str) -> Option<Session>;
}

struct Entry {
    session: Session,
    created_at: Instant,
}

/// Process-local store; sessions older than `ttl` are dropped lazily.
pub struct MemorySessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Entry>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn live(&self, entry: &Entry) -> bool {
        entry.created_at.elapsed() < self.ttl
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &str) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .filter(|entry| self.live(entry))
            .map(|entry| entry.session.clone())
    }

    async fn insert(&self, session: Session) {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.created_at.elapsed() < self.ttl);
        if sessions.len() < before {
            debug!(purged = before - sessions.len(), "dropped expired sessions");
        }
        sessions.insert(
            session.id().to_string(),
            Entry {
                session,
                created_at: Instant::now(),
            },
        );
    }

    async fn replace(&self, id: &str, tokens: TokenPair) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(entry) if entry.created_at.elapsed() < self.ttl => {
                entry.session.set_tokens(tokens);
                true
            }
            _ => false,
        }
    }

    async fn mark_error(&self, id: &str, error: SessionError) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(entry) => {
                entry.session.set_error(error);
                true
            }
            None => false,
        }
    }

    async fn clear(&self, id: &str) -> Option<Session> {
        self.sessions
            .write()
            .await
            .remove(id)
            .map(|entry| entry.session)
    }
}
