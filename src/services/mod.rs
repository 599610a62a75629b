// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - entry cache, session lifecycle and auth provider.

pub mod confirm;
pub mod entry_cache;
pub mod erasure;
pub mod firebase_auth;
pub mod observers;
pub mod session;
pub mod views;

pub use confirm::{ConfirmRequest, ConfirmationGate};
pub use entry_cache::{DeleteOutcome, EntryCache, LoadOutcome, WriteOutcome};
pub use erasure::{erase_account, AccountDeleter, ErasureError, ErasureOutcome};
pub use firebase_auth::{CurrentAccount, FirebaseTokenVerifier, IdentityToolkit};
pub use observers::{ObserverFailure, ObserverRegistry, Snapshot, Subscription};
pub use session::{SessionBinding, SessionHub, SessionState, SessionUser, UserSession};
pub use views::{ListRow, ListView, MapView};
