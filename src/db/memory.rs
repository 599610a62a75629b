// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process entry store.
//!
//! Used for offline mode and tests. Keeps insertion order per user, and can
//! be told to fail the next call of a given operation.

use crate::db::{check_batch_size, EntryStore};
use crate::error::AppError;
use crate::models::{Entry, EntryData};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Store operations, for call counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Add,
    Set,
    Delete,
    DeleteBatch,
}

/// Thread-safe in-memory document store.
#[derive(Default)]
pub struct MemoryStore {
    docs: DashMap<String, Vec<Entry>>,
    next_id: AtomicU64,
    calls: DashMap<StoreOp, usize>,
    failures: DashMap<StoreOp, usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `times` calls of `op` fail with a database error.
    pub fn fail_next(&self, op: StoreOp, times: usize) {
        *self.failures.entry(op).or_default() += times;
    }

    /// Number of calls of `op` so far, failed ones included.
    pub fn calls(&self, op: StoreOp) -> usize {
        self.calls.get(&op).map(|c| *c).unwrap_or(0)
    }

    /// Total calls across all operations.
    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|c| *c.value()).sum()
    }

    /// Number of documents currently stored for a user.
    pub fn count(&self, user_id: &str) -> usize {
        self.docs.get(user_id).map(|d| d.len()).unwrap_or(0)
    }

    /// Insert a document directly, bypassing counters.
    pub fn seed(&self, user_id: &str, data: EntryData) -> String {
        let id = self.generate_id();
        self.docs
            .entry(user_id.to_string())
            .or_default()
            .push(Entry {
                id: id.clone(),
                data,
            });
        id
    }

    fn generate_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("col{:08}", n)
    }

    /// Record a call and consume one injected failure if armed.
    fn begin(&self, op: StoreOp) -> Result<(), AppError> {
        *self.calls.entry(op).or_default() += 1;

        if let Some(mut remaining) = self.failures.get_mut(&op) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(AppError::Database(format!("injected {:?} failure", op)));
            }
        }
        Ok(())
    }
}

impl EntryStore for MemoryStore {
    async fn list(&self, user_id: &str) -> Result<Vec<Entry>, AppError> {
        self.begin(StoreOp::List)?;
        Ok(self
            .docs
            .get(user_id)
            .map(|docs| docs.clone())
            .unwrap_or_default())
    }

    async fn add(&self, user_id: &str, data: &EntryData) -> Result<String, AppError> {
        self.begin(StoreOp::Add)?;
        Ok(self.seed(user_id, data.clone()))
    }

    async fn set(&self, user_id: &str, id: &str, data: &EntryData) -> Result<(), AppError> {
        self.begin(StoreOp::Set)?;

        let mut docs = self.docs.entry(user_id.to_string()).or_default();
        let position = docs.iter().position(|e| e.id == id);
        match position {
            Some(i) => docs[i].data = data.clone(),
            None => docs.push(Entry {
                id: id.to_string(),
                data: data.clone(),
            }),
        }
        Ok(())
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        self.begin(StoreOp::Delete)?;

        if let Some(mut docs) = self.docs.get_mut(user_id) {
            docs.retain(|e| e.id != id);
        }
        Ok(())
    }

    async fn delete_batch(&self, user_id: &str, ids: &[String]) -> Result<(), AppError> {
        self.begin(StoreOp::DeleteBatch)?;
        check_batch_size(ids.len())?;

        // The shard guard makes the whole removal a single step for readers.
        if let Some(mut docs) = self.docs.get_mut(user_id) {
            docs.retain(|e| !ids.contains(&e.id));
        }
        Ok(())
    }
}
