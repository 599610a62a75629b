// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session lifecycle: binds the entry cache to the signed-in user.
//!
//! The auth provider delivers `Some(user)` / `None` signals, possibly
//! several times for the same user (token refresh). Each delivery re-runs the
//! whole transition; a repeated sign-in is a refresh.

use crate::db::EntryStore;
use crate::error::AppError;
use crate::services::entry_cache::EntryCache;
use crate::services::views::{ListView, MapView};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{watch, OnceCell};

/// Sessions unused for this long are signed out by [`SessionHub::evict_idle`].
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// The auth provider's user descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

impl SessionUser {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
            photo_url: None,
        }
    }
}

/// Which UI should be showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated(SessionUser),
}

impl SessionState {
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Authenticated(user) => Some(user),
        }
    }
}

/// Drives an [`EntryCache`] from session-state signals.
pub struct SessionBinding<S> {
    cache: Arc<EntryCache<S>>,
    state: watch::Sender<SessionState>,
}

impl<S: EntryStore> SessionBinding<S> {
    pub fn new(cache: Arc<EntryCache<S>>) -> Self {
        let (state, _) = watch::channel(SessionState::Anonymous);
        Self { cache, state }
    }

    pub fn cache(&self) -> &Arc<EntryCache<S>> {
        &self.cache
    }

    /// Observe the published session state.
    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Apply one session-state signal and publish the resulting state.
    pub async fn on_session_change(&self, user: Option<SessionUser>) -> SessionState {
        self.transition(user).await.0
    }

    /// Like [`on_session_change`](Self::on_session_change) for a sign-in, but
    /// hands back the load error instead of only logging it.
    ///
    /// The state is published as `Authenticated` either way.
    pub async fn sign_in(&self, user: SessionUser) -> Result<SessionState, AppError> {
        match self.transition(Some(user)).await {
            (_, Some(e)) => Err(e),
            (next, None) => Ok(next),
        }
    }

    async fn transition(&self, user: Option<SessionUser>) -> (SessionState, Option<AppError>) {
        let mut load_error = None;
        let next = match user {
            Some(user) => {
                let switching = self
                    .current()
                    .user()
                    .is_some_and(|current| current.uid != user.uid);
                if switching {
                    tracing::info!(uid = %user.uid, "Switching user, discarding previous entries");
                    self.cache.clear();
                }

                // A failed load keeps the previous snapshot; the session still opens.
                if let Err(e) = self.cache.load(&user.uid).await {
                    tracing::warn!(uid = %user.uid, error = %e, "Initial load failed");
                    load_error = Some(e);
                }
                SessionState::Authenticated(user)
            }
            None => {
                self.cache.clear();
                SessionState::Anonymous
            }
        };

        self.state.send_replace(next.clone());
        (next, load_error)
    }

    /// Follow `signal` until its sender goes away.
    pub async fn run(&self, mut signal: watch::Receiver<Option<SessionUser>>) {
        loop {
            let user = signal.borrow_and_update().clone();
            self.on_session_change(user).await;

            if signal.changed().await.is_err() {
                tracing::debug!("Session signal closed");
                break;
            }
        }
    }
}

/// One signed-in user's context: cache, binding and rendered views.
pub struct UserSession<S> {
    pub binding: SessionBinding<S>,
    pub list: Arc<ListView>,
    pub map: Arc<MapView>,
    started: OnceCell<()>,
    last_seen: Mutex<Instant>,
}

impl<S: EntryStore> UserSession<S> {
    fn new(store: Arc<S>) -> Self {
        let cache = Arc::new(EntryCache::new(store));
        let list = ListView::new();
        let map = MapView::new();
        // Views live as long as the session, so their subscriptions are never disposed.
        list.attach(&cache);
        map.attach(&cache);

        Self {
            binding: SessionBinding::new(cache),
            list,
            map,
            started: OnceCell::new(),
            last_seen: Mutex::new(Instant::now()),
        }
    }

    pub fn cache(&self) -> &Arc<EntryCache<S>> {
        self.binding.cache()
    }

    fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }
}

/// Per-user sessions hosted side by side.
pub struct SessionHub<S> {
    store: Arc<S>,
    sessions: DashMap<String, Arc<UserSession<S>>>,
    idle_timeout: Duration,
}

impl<S: EntryStore> SessionHub<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_idle_timeout(store, DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(store: Arc<S>, idle_timeout: Duration) -> Self {
        Self {
            store,
            sessions: DashMap::new(),
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Session for `user`, signing it in (and loading its entries) on first use.
    ///
    /// A session whose sign-in load failed is not started; the next `open`
    /// runs the sign-in again.
    pub async fn open(&self, user: &SessionUser) -> Arc<UserSession<S>> {
        let session = self
            .sessions
            .entry(user.uid.clone())
            .or_insert_with(|| Arc::new(UserSession::new(self.store.clone())))
            .clone();
        session.touch();

        let started = session
            .started
            .get_or_try_init(|| async {
                tracing::info!(uid = %user.uid, "Opening session");
                session.binding.sign_in(user.clone()).await.map(|_| ())
            })
            .await;
        if started.is_err() {
            tracing::warn!(uid = %user.uid, "Session not started, retrying on next request");
        }

        session
    }

    pub fn get(&self, uid: &str) -> Option<Arc<UserSession<S>>> {
        self.sessions.get(uid).map(|s| s.clone())
    }

    /// Sign `uid` out and drop its session.
    pub async fn close(&self, uid: &str) -> bool {
        let Some((_, session)) = self.sessions.remove(uid) else {
            return false;
        };
        session.binding.on_session_change(None).await;
        tracing::info!(uid, "Session closed");
        true
    }

    /// Sign out and drop every session idle for at least the idle timeout.
    ///
    /// Returns how many were evicted.
    pub async fn evict_idle(&self) -> usize {
        let stale: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().idle_for() >= self.idle_timeout)
            .map(|entry| entry.key().clone())
            .collect();

        let mut evicted = 0;
        for uid in stale {
            // Re-checked under the shard lock: an `open` may have touched it since.
            let Some((_, session)) = self
                .sessions
                .remove_if(&uid, |_, session| session.idle_for() >= self.idle_timeout)
            else {
                continue;
            };
            session.binding.on_session_change(None).await;
            evicted += 1;
        }

        if evicted > 0 {
            tracing::info!(evicted, remaining = self.sessions.len(), "Evicted idle sessions");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
