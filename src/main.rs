// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cyclology API Server
//!
//! Keeps a per-user journal of climbed cycling cols in Firestore, behind
//! Firebase Authentication.

use cyclology::{
    config::Config, db::FirestoreDb, services::FirebaseTokenVerifier, AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Cyclology API");

    // Initialize Firestore database
    let db = Arc::new(FirestoreDb::new(&config.gcp_project_id).await?);

    let verifier = Arc::new(FirebaseTokenVerifier::new(&config)?);
    tracing::info!(
        identity_toolkit = %config.identity_toolkit_url,
        "Firebase Authentication initialized"
    );

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db, verifier));

    // Drop sessions nobody has used for a while
    tokio::spawn(evict_idle_sessions(state.clone()));

    // Build router
    let app = cyclology::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodically sign out idle sessions.
async fn evict_idle_sessions(state: Arc<AppState>) {
    let period = (state.sessions.idle_timeout() / 2).max(Duration::from_secs(1));
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        state.sessions.evict_idle().await;
    }
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cyclology=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
