// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Confirmation gate for destructive actions.
//!
//! The gate belongs to whoever talks to the user; the data layer only asks.

use crate::models::Entry;
use std::future::Future;

/// What the user is being asked to confirm.
#[derive(Debug, Clone, Copy)]
pub enum ConfirmRequest<'a> {
    DeleteEntry(&'a Entry),
    EraseAccount { user_id: &'a str },
}

impl ConfirmRequest<'_> {
    /// Question to show the user.
    pub fn prompt(&self) -> String {
        match self {
            ConfirmRequest::DeleteEntry(entry) => {
                format!("Are you sure you want to delete \"{}\"?", entry.name())
            }
            ConfirmRequest::EraseAccount { .. } => {
                "Delete your account and all recorded cols? This cannot be undone.".to_string()
            }
        }
    }
}

pub trait ConfirmationGate: Send + Sync {
    /// Resolve to `true` only if the user accepted.
    fn confirm(&self, request: &ConfirmRequest<'_>) -> impl Future<Output = bool> + Send;
}

/// A pre-answered confirmation, e.g. an explicit `confirm=true` request flag.
impl ConfirmationGate for bool {
    async fn confirm(&self, _request: &ConfirmRequest<'_>) -> bool {
        *self
    }
}
