// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Cyclology: a journal of the cycling cols you have climbed
//!
//! This crate provides the backend API: a per-user reactive cache of col
//! entries kept in sync with Firestore, bound to the Firebase sign-in
//! session, plus account erasure.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::{EntryStore, FirestoreDb};
use services::{FirebaseTokenVerifier, IdentityToolkit, SessionHub};
use std::sync::Arc;

/// Shared application state.
pub struct AppState<S: EntryStore = FirestoreDb> {
    pub config: Config,
    pub sessions: SessionHub<S>,
    pub verifier: Arc<FirebaseTokenVerifier>,
    pub accounts: IdentityToolkit,
}

impl<S: EntryStore> AppState<S> {
    pub fn new(config: Config, store: Arc<S>, verifier: Arc<FirebaseTokenVerifier>) -> Self {
        let accounts = IdentityToolkit::new(&config);
        let sessions = SessionHub::with_idle_timeout(store, config.session_idle_timeout);
        Self {
            config,
            sessions,
            verifier,
            accounts,
        }
    }
}
