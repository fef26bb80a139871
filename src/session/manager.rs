//! Lazy token refresh with per-session single-flight.
//!
//! Nothing runs on a timer. A caller asking for the current session triggers
//! the `Fresh -> Expiring` check; an expiring session is refreshed by exactly
//! one caller while the others wait on the session's slot and then share the
//! outcome.

use super::{
    model::{Session, SessionError},
    store::SessionStore,
    token::{TokenState, now_ms},
};
use crate::error::AuthError;
use async_trait::async_trait;
use secrecy::SecretString;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Tokens returned by the backend refresh endpoint.
#[derive(Debug)]
pub struct RefreshGrant {
    pub access: String,
    pub refresh: Option<String>,
}

/// Exchanges a refresh token for a new access token.
///
/// Implementations return [`AuthError::RefreshTokenExpired`] when the backend
/// rejects the token and [`AuthError::BackendUnavailable`] for anything transient.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &SecretString) -> Result<RefreshGrant, AuthError>;
}

#[derive(Default)]
struct RefreshSlot {
    last: Mutex<Option<Result<(), AuthError>>>,
    generation: AtomicU64,
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct TokenManager {
    store: Arc<dyn SessionStore>,
    refresher: Arc<dyn TokenRefresher>,
    slots: Mutex<HashMap<String, Arc<RefreshSlot>>>,
}

impl TokenManager {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            store,
            refresher,
            slots: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Current session with a usable access token, refreshing it first if needed.
    ///
    /// # Errors
    /// `Unauthorized` for unknown sessions, the sticky error for invalidated
    /// ones, `BackendUnavailable` when the refresh could not reach the backend.
    pub async fn current(&self, id: &str) -> Result<Session, AuthError> {
        let Some(session) = self.store.get(id).await else {
            self.forget(id).await;
            return Err(AuthError::Unauthorized);
        };
        if let Some(error) = session.error() {
            return Err(error.into());
        }
        if session.token_state(now_ms()) == TokenState::Fresh {
            return Ok(session);
        }
        self.refresh(id).await
    }

    /// Observable state of a session's tokens, `None` if the session is unknown.
    pub async fn state(&self, id: &str) -> Option<TokenState> {
        let session = self.store.get(id).await?;
        let refreshing = self
            .slots
            .lock()
            .await
            .get(id)
            .is_some_and(|slot| slot.in_flight.load(Ordering::Acquire));
        if refreshing {
            Some(TokenState::Refreshing)
        } else {
            Some(session.token_state(now_ms()))
        }
    }

    /// Drop the refresh slot of a session that is gone.
    pub async fn forget(&self, id: &str) {
        self.slots.lock().await.remove(id);
    }

    async fn slot(&self, id: &str) -> Arc<RefreshSlot> {
        let mut slots = self.slots.lock().await;
        slots.entry(id.to_string()).or_default().clone()
    }

    async fn refresh(&self, id: &str) -> Result<Session, AuthError> {
        let slot = self.slot(id).await;
        let outcome = self.refresh_in(&slot, id).await;
        drop(slot);
        self.release(id).await;
        outcome
    }

    /// Remove the slot once no caller holds it; slots are only cloned under
    /// the map lock, so a count of one means nobody is waiting on it.
    async fn release(&self, id: &str) {
        let mut slots = self.slots.lock().await;
        if slots.get(id).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            slots.remove(id);
        }
    }

    async fn refresh_in(&self, slot: &RefreshSlot, id: &str) -> Result<Session, AuthError> {
        let seen = slot.generation.load(Ordering::Acquire);
        let mut last = slot.last.lock().await;

        // Someone refreshed while we waited: share their outcome.
        if slot.generation.load(Ordering::Acquire) != seen {
            if let Some(Err(error)) = last.as_ref() {
                return Err(error.clone());
            }
            return self.reload(id).await;
        }

        let session = self.reload(id).await?;
        if session.token_state(now_ms()) == TokenState::Fresh {
            return Ok(session);
        }

        let _in_flight = InFlight::enter(&slot.in_flight);
        let outcome = self.exchange(&session).await;
        *last = Some(outcome.as_ref().map(|_| ()).map_err(Clone::clone));
        slot.generation.fetch_add(1, Ordering::AcqRel);
        outcome
    }

    async fn reload(&self, id: &str) -> Result<Session, AuthError> {
        let session = self.store.get(id).await.ok_or(AuthError::Unauthorized)?;
        match session.error() {
            Some(error) => Err(error.into()),
            None => Ok(session),
        }
    }

    async fn exchange(&self, session: &Session) -> Result<Session, AuthError> {
        let id = session.id();
        let Some(refresh_token) = session.tokens().refresh_token() else {
            info!(federated = session.is_federated(), "session expired without refresh token");
            self.store.mark_error(id, SessionError::NoRefreshToken).await;
            return Err(AuthError::NoRefreshToken);
        };

        debug!("refreshing access token");
        match self.refresher.refresh(refresh_token).await {
            Ok(grant) => {
                let pair = session
                    .tokens()
                    .rotated(grant.access, grant.refresh)
                    .map_err(|err| AuthError::backend(format!("invalid access token: {err}")))?;
                if !self.store.replace(id, pair).await {
                    return Err(AuthError::Unauthorized);
                }
                self.reload(id).await
            }
            Err(error) if error.is_transient() => {
                warn!("token refresh failed: {error}");
                Err(error)
            }
            Err(error) => {
                warn!("refresh token rejected: {error}");
                self.store
                    .mark_error(id, SessionError::RefreshTokenExpired)
                    .await;
                Err(AuthError::RefreshTokenExpired)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{
        model::Identity,
        role::Role,
        store::MemorySessionStore,
        token::{TokenPair, test_jwt},
    };
    use anyhow::Result;
    use secrecy::ExposeSecret;
    use std::{sync::atomic::AtomicUsize, time::Duration};
    use tokio::{sync::Semaphore, task::JoinSet};

    enum Reply {
        Grant,
        Reject,
        Unavailable,
    }

    struct FakeRefresher {
        calls: AtomicUsize,
        reply: Reply,
        gate: Semaphore,
    }

    impl FakeRefresher {
        fn new(reply: Reply, open: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                reply,
                gate: Semaphore::new(if open { Semaphore::MAX_PERMITS } else { 0 }),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenRefresher for FakeRefresher {
        async fn refresh(&self, _refresh_token: &SecretString) -> Result<RefreshGrant, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|err| AuthError::backend(err.to_string()))?;
            match self.reply {
                Reply::Grant => Ok(RefreshGrant {
                    access: test_jwt(now_ms() / 1000 + 3600),
                    refresh: None,
                }),
                Reply::Reject => Err(AuthError::RefreshTokenExpired),
                Reply::Unavailable => Err(AuthError::backend("connection refused")),
            }
        }
    }

    fn identity() -> Identity {
        Identity {
            user_id: "3".to_string(),
            display_name: "alan".to_string(),
            email: "alan@campus.edu".to_string(),
            role: Some(Role::Student),
        }
    }

    async fn setup(
        refresher: Arc<FakeRefresher>,
        tokens: TokenPair,
        federated: bool,
    ) -> (Arc<TokenManager>, String) {
        let store = Arc::new(MemorySessionStore::new(Duration::from_secs(60)));
        let session = Session::new(identity(), tokens, federated);
        let id = session.id().to_string();
        store.insert(session).await;
        (Arc::new(TokenManager::new(store, refresher)), id)
    }

    fn expired_pair() -> TokenPair {
        TokenPair::new(
            SecretString::from(test_jwt(1)),
            Some(SecretString::from("refresh-1")),
            1_000,
        )
    }

    #[tokio::test]
    async fn fresh_session_is_returned_without_refresh() -> Result<()> {
        let refresher = FakeRefresher::new(Reply::Grant, true);
        let pair = TokenPair::new(
            SecretString::from("access"),
            Some(SecretString::from("refresh")),
            now_ms() + 60_000,
        );
        let (manager, id) = setup(refresher.clone(), pair, false).await;

        let session = manager.current(&id).await?;
        assert_eq!(session.tokens().access_token().expose_secret(), "access");
        assert_eq!(refresher.calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn token_inside_skew_window_is_refreshed() -> Result<()> {
        let refresher = FakeRefresher::new(Reply::Grant, true);
        let pair = TokenPair::new(
            SecretString::from("access"),
            Some(SecretString::from("refresh")),
            now_ms() + 5_000,
        );
        let (manager, id) = setup(refresher.clone(), pair, false).await;

        let session = manager.current(&id).await?;
        assert_eq!(refresher.calls(), 1);
        assert_eq!(session.token_state(now_ms()), TokenState::Fresh);
        // Rotation is backend controlled; the old refresh token is kept.
        assert_eq!(
            session
                .tokens()
                .refresh_token()
                .map(|t| t.expose_secret().to_string()),
            Some("refresh".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() -> Result<()> {
        let refresher = FakeRefresher::new(Reply::Grant, false);
        let (manager, id) = setup(refresher.clone(), expired_pair(), false).await;

        let mut callers = JoinSet::new();
        for _ in 0..8 {
            let manager = manager.clone();
            let id = id.clone();
            callers.spawn(async move { manager.current(&id).await });
        }

        while manager.state(&id).await != Some(TokenState::Refreshing) {
            tokio::task::yield_now().await;
        }
        refresher.gate.add_permits(Semaphore::MAX_PERMITS);

        let mut tokens = Vec::new();
        while let Some(joined) = callers.join_next().await {
            let session = joined??;
            tokens.push(session.tokens().access_token().expose_secret().to_string());
        }

        assert_eq!(refresher.calls(), 1);
        assert_eq!(tokens.len(), 8);
        assert!(tokens.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(manager.state(&id).await, Some(TokenState::Fresh));
        assert_eq!(manager.slots.lock().await.len(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_slots_do_not_outlive_refreshes() -> Result<()> {
        let refresher = FakeRefresher::new(Reply::Grant, true);
        let store = Arc::new(MemorySessionStore::new(Duration::from_millis(50)));
        let manager = TokenManager::new(store.clone(), refresher.clone());

        for _ in 0..20 {
            let session = Session::new(identity(), expired_pair(), false);
            let id = session.id().to_string();
            store.insert(session).await;
            manager.current(&id).await?;
        }
        assert_eq!(refresher.calls(), 20);
        assert_eq!(manager.slots.lock().await.len(), 0);

        // Abandoned sessions purged by the store leave nothing behind either.
        tokio::time::sleep(Duration::from_millis(80)).await;
        store
            .insert(Session::new(identity(), expired_pair(), false))
            .await;
        assert_eq!(manager.slots.lock().await.len(), 0);

        let failing = TokenManager::new(
            store.clone(),
            FakeRefresher::new(Reply::Unavailable, true),
        );
        let session = Session::new(identity(), expired_pair(), false);
        let id = session.id().to_string();
        store.insert(session).await;
        assert!(failing.current(&id).await.is_err());
        assert_eq!(failing.slots.lock().await.len(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_refresh_is_sticky_and_never_retried() {
        let refresher = FakeRefresher::new(Reply::Reject, true);
        let (manager, id) = setup(refresher.clone(), expired_pair(), false).await;

        assert_eq!(manager.state(&id).await, Some(TokenState::Expiring));
        assert_eq!(
            manager.current(&id).await.err(),
            Some(AuthError::RefreshTokenExpired)
        );
        assert_eq!(manager.state(&id).await, Some(TokenState::Invalid));

        assert_eq!(
            manager.current(&id).await.err(),
            Some(AuthError::RefreshTokenExpired)
        );
        assert_eq!(refresher.calls(), 1);
    }

    #[tokio::test]
    async fn federated_session_without_refresh_token_goes_invalid() {
        let refresher = FakeRefresher::new(Reply::Grant, true);
        let pair = TokenPair::federated("google-id-token".to_string(), now_ms() - 2 * 3_600_000);
        let (manager, id) = setup(refresher.clone(), pair, true).await;

        assert_eq!(
            manager.current(&id).await.err(),
            Some(AuthError::NoRefreshToken)
        );
        assert_eq!(manager.state(&id).await, Some(TokenState::Invalid));
        assert_eq!(refresher.calls(), 0);
    }

    #[tokio::test]
    async fn transient_failure_leaves_session_usable_later() {
        let refresher = FakeRefresher::new(Reply::Unavailable, true);
        let (manager, id) = setup(refresher.clone(), expired_pair(), false).await;

        let error = manager.current(&id).await.err();
        assert!(matches!(error, Some(AuthError::BackendUnavailable(_))));
        assert_eq!(manager.state(&id).await, Some(TokenState::Expiring));
        assert_eq!(refresher.calls(), 1);
    }

    #[tokio::test]
    async fn unknown_session_is_unauthorized() {
        let refresher = FakeRefresher::new(Reply::Grant, true);
        let (manager, _id) = setup(refresher, expired_pair(), false).await;
        assert_eq!(
            manager.current("nope").await.err(),
            Some(AuthError::Unauthorized)
        );
        assert_eq!(manager.state("nope").await, None);
    }
}
