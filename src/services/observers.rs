// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Snapshot observers.
//!
//! Callbacks run synchronously, in registration order, outside the registry
//! lock. A failing or panicking callback is reported and skipped; the rest
//! still run.

use crate::models::Entry;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Immutable view of the cached entries.
pub type Snapshot = Arc<[Entry]>;

type Callback = Arc<dyn Fn(&Snapshot) -> anyhow::Result<()> + Send + Sync>;

struct Slot {
    id: u64,
    callback: Callback,
}

#[derive(Default)]
struct RegistryInner {
    next_id: AtomicU64,
    slots: Mutex<Vec<Slot>>,
}

impl RegistryInner {
    fn remove(&self, id: u64) -> bool {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let before = slots.len();
        slots.retain(|slot| slot.id != id);
        slots.len() != before
    }
}

/// A callback that returned an error or panicked during notification.
#[derive(Debug, Clone)]
pub struct ObserverFailure {
    pub subscription: u64,
    pub message: String,
}

/// Handle to a registered callback.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<RegistryInner>,
}

impl Subscription {
    /// Stop receiving notifications. Returns false if already gone.
    pub fn dispose(self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.remove(self.id))
    }
}

impl std::fmt::Debug for RegistryInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryInner").finish_non_exhaustive()
    }
}

/// Ordered set of snapshot callbacks.
#[derive(Default)]
pub struct ObserverRegistry {
    inner: Arc<RegistryInner>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` and immediately deliver `current` to it.
    pub fn subscribe<F>(&self, callback: F, current: &Snapshot) -> Subscription
    where
        F: Fn(&Snapshot) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let callback: Callback = Arc::new(callback);

        self.inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Slot {
                id,
                callback: callback.clone(),
            });

        if let Some(failure) = invoke(id, &callback, current) {
            report(&failure);
        }

        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver `snapshot` to every callback, returning the ones that failed.
    pub fn notify(&self, snapshot: &Snapshot) -> Vec<ObserverFailure> {
        let callbacks: Vec<(u64, Callback)> = self
            .inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|slot| (slot.id, slot.callback.clone()))
            .collect();

        let failures: Vec<ObserverFailure> = callbacks
            .iter()
            .filter_map(|(id, callback)| invoke(*id, callback, snapshot))
            .collect();

        for failure in &failures {
            report(failure);
        }
        failures
    }

    pub fn len(&self) -> usize {
        self.inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn invoke(id: u64, callback: &Callback, snapshot: &Snapshot) -> Option<ObserverFailure> {
    let message = match panic::catch_unwind(AssertUnwindSafe(|| callback(snapshot))) {
        Ok(Ok(())) => return None,
        Ok(Err(e)) => format!("{e:#}"),
        Err(payload) => {
            if let Some(s) = payload.downcast_ref::<&str>() {
                format!("panicked: {s}")
            } else if let Some(s) = payload.downcast_ref::<String>() {
                format!("panicked: {s}")
            } else {
                "panicked".to_string()
            }
        }
    };

    Some(ObserverFailure {
        subscription: id,
        message,
    })
}

fn report(failure: &ObserverFailure) {
    tracing::warn!(
        subscription = failure.subscription,
        error = %failure.message,
        "Snapshot observer failed"
    );
}
