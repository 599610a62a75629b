// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side cache of the signed-in user's entries.
//!
//! The snapshot is always a copy of what the store returned on the last
//! applied load: every mutation goes to the store first and is followed by a
//! full reload. Each load and clear takes a new generation number when
//! issued; a load whose generation is no longer the latest when it completes
//! is discarded, so the last *issued* operation wins.
//!
//! Notifications are delivered by one thread at a time and always carry the
//! snapshot current at delivery. A swap made while another thread is
//! delivering is picked up by that thread before it stops, so observers end
//! on the latest snapshot whatever the interleaving.

use crate::db::EntryStore;
use crate::error::{AppError, Result};
use crate::models::EntryData;
use crate::services::confirm::{ConfirmRequest, ConfirmationGate};
use crate::services::observers::{ObserverRegistry, Snapshot, Subscription};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Result of a `load` call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Snapshot replaced with this many entries and observers notified.
    Applied(usize),
    /// A later load or clear was issued while this one was in flight.
    Superseded,
    /// No user ID was given.
    Skipped,
}

/// Result of `add` / `update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Persisted under this document ID.
    Saved(String),
    /// The cache is not bound to a user; nothing was written.
    NotBound,
}

/// Result of `delete`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The user refused; nothing was touched.
    Cancelled,
    /// No entry with that ID in the current snapshot.
    NotFound,
}

struct CacheState {
    entries: Snapshot,
    bound_user: Option<String>,
    generation: u64,
    /// A thread is delivering notifications.
    notifying: bool,
    /// The snapshot changed since the last delivery started.
    dirty: bool,
}

/// Entry cache bound to at most one user at a time.
pub struct EntryCache<S> {
    store: Arc<S>,
    state: Mutex<CacheState>,
    observers: ObserverRegistry,
}

impl<S: EntryStore> EntryCache<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            state: Mutex::new(CacheState {
                entries: Arc::from(Vec::new()),
                bound_user: None,
                generation: 0,
                notifying: false,
                dirty: false,
            }),
            observers: ObserverRegistry::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current entries. Cheap to clone, never mutated in place.
    pub fn snapshot(&self) -> Snapshot {
        self.state().entries.clone()
    }

    /// User the cache is currently bound to.
    pub fn bound_user(&self) -> Option<String> {
        self.state().bound_user.clone()
    }

    /// Register an observer; it is called at once with the current snapshot.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Snapshot) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let current = self.snapshot();
        let subscription = self.observers.subscribe(callback, &current);

        // A swap may have been delivered to the new callback before its
        // initial call with `current`; deliver again so it ends up current.
        if !Arc::ptr_eq(&current, &self.snapshot()) {
            self.state().dirty = true;
            self.publish();
        }
        subscription
    }

    /// Deliver the current snapshot, unless another thread is already
    /// delivering, in which case that thread delivers it.
    fn publish(&self) {
        {
            let mut state = self.state();
            if state.notifying {
                return;
            }
            state.notifying = true;
        }

        loop {
            let snapshot = {
                let mut state = self.state();
                if !state.dirty {
                    state.notifying = false;
                    return;
                }
                state.dirty = false;
                state.entries.clone()
            };
            self.observers.notify(&snapshot);
        }
    }

    /// Bind to `user_id` and replace the snapshot with the user's entries.
    ///
    /// On failure the previous snapshot is kept and no observer is notified.
    pub async fn load(&self, user_id: &str) -> Result<LoadOutcome> {
        if user_id.is_empty() {
            return Ok(LoadOutcome::Skipped);
        }

        let generation = {
            let mut state = self.state();
            state.generation += 1;
            state.bound_user = Some(user_id.to_string());
            state.generation
        };

        let entries = match self.store.list(user_id).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(user_id, error = %e, "Failed to load entries");
                return Err(e);
            }
        };

        let count = {
            let mut state = self.state();
            if state.generation != generation {
                tracing::debug!(
                    user_id,
                    issued = generation,
                    latest = state.generation,
                    "Discarding superseded load"
                );
                return Ok(LoadOutcome::Superseded);
            }
            state.entries = Arc::from(entries);
            state.dirty = true;
            state.entries.len()
        };

        tracing::debug!(user_id, count, "Entries loaded");
        self.publish();
        Ok(LoadOutcome::Applied(count))
    }

    /// Empty the snapshot and unbind. Any load still in flight is discarded.
    pub fn clear(&self) {
        {
            let mut state = self.state();
            state.generation += 1;
            state.bound_user = None;
            state.entries = Arc::from(Vec::new());
            state.dirty = true;
        }
        self.publish();
    }

    /// Reload after a successful write. A failed reload leaves the write in place.
    async fn refresh(&self, user_id: &str) {
        if self.bound_user().as_deref() != Some(user_id) {
            tracing::debug!(user_id, "Session changed during write, skipping reload");
            return;
        }
        if let Err(e) = self.load(user_id).await {
            tracing::warn!(user_id, error = %e, "Reload after write failed");
        }
    }

    /// Persist a new entry, then reload so the store-assigned ID is cached.
    pub async fn add(&self, data: &EntryData) -> Result<WriteOutcome> {
        let Some(user_id) = self.bound_user() else {
            return Ok(WriteOutcome::NotBound);
        };

        let id = match self.store.add(&user_id, data).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Failed to add entry");
                return Err(e);
            }
        };
        tracing::info!(user_id = %user_id, id = %id, "Entry added");

        self.refresh(&user_id).await;
        Ok(WriteOutcome::Saved(id))
    }

    /// Overwrite the whole entry `id`, then reload.
    pub async fn update(&self, id: &str, data: &EntryData) -> Result<WriteOutcome> {
        let Some(user_id) = self.bound_user() else {
            return Ok(WriteOutcome::NotBound);
        };
        if id.is_empty() {
            return Err(AppError::BadRequest("entry id must not be empty".to_string()));
        }
        if !self.snapshot().iter().any(|e| e.id == id) {
            return Err(AppError::NotFound(format!("Entry {} not found", id)));
        }

        if let Err(e) = self.store.set(&user_id, id, data).await {
            tracing::error!(user_id = %user_id, id, error = %e, "Failed to update entry");
            return Err(e);
        }
        tracing::info!(user_id = %user_id, id, "Entry updated");

        self.refresh(&user_id).await;
        Ok(WriteOutcome::Saved(id.to_string()))
    }

    /// Delete entry `id` once `gate` confirms, then reload.
    pub async fn delete<G: ConfirmationGate>(&self, id: &str, gate: &G) -> Result<DeleteOutcome> {
        let Some(entry) = self.snapshot().iter().find(|e| e.id == id).cloned() else {
            return Ok(DeleteOutcome::NotFound);
        };

        if !gate.confirm(&ConfirmRequest::DeleteEntry(&entry)).await {
            tracing::debug!(id, "Deletion not confirmed");
            return Ok(DeleteOutcome::Cancelled);
        }

        let Some(user_id) = self.bound_user() else {
            return Ok(DeleteOutcome::NotFound);
        };

        if let Err(e) = self.store.delete(&user_id, id).await {
            tracing::error!(user_id = %user_id, id, error = %e, "Failed to delete entry");
            return Err(e);
        }
        tracing::info!(user_id = %user_id, id, "Entry deleted");

        self.refresh(&user_id).await;
        Ok(DeleteOutcome::Deleted)
    }

    /// Delete every stored entry of `user_id` in one atomic batch, then clear.
    ///
    /// Returns the number of deleted documents. With nothing stored, returns
    /// 0 and leaves the snapshot alone.
    pub async fn delete_all_for_user(&self, user_id: &str) -> Result<usize> {
        if user_id.is_empty() {
            return Ok(0);
        }

        let ids: Vec<String> = self
            .store
            .list(user_id)
            .await?
            .into_iter()
            .map(|e| e.id)
            .collect();
        if ids.is_empty() {
            return Ok(0);
        }

        if let Err(e) = self.store.delete_batch(user_id, &ids).await {
            tracing::error!(user_id, count = ids.len(), error = %e, "Batch deletion failed");
            return Err(e);
        }
        tracing::info!(user_id, count = ids.len(), "Deleted all entries");

        self.clear();
        Ok(ids.len())
    }
}
