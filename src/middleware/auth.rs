// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase ID token authentication middleware.

use crate::db::EntryStore;
use crate::error::AppError;
use crate::services::firebase_auth::extract_bearer_token;
use crate::services::SessionUser;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Cookie the web client stores the Firebase ID token in.
pub const TOKEN_COOKIE: &str = "cyclology_token";

/// Authenticated user extracted from a verified ID token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: SessionUser,
    /// The raw token, needed for account deletion.
    pub id_token: String,
}

impl AuthUser {
    pub fn uid(&self) -> &str {
        &self.user.uid
    }
}

/// Middleware that requires a valid Firebase ID token.
pub async fn require_auth<S: EntryStore>(
    State(state): State<Arc<AppState<S>>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Try cookie first, then header
    let token = match jar.get(TOKEN_COOKIE) {
        Some(cookie) if !cookie.value().is_empty() => cookie.value().to_string(),
        _ => extract_bearer_token(request.headers().get(header::AUTHORIZATION))
            .ok_or(AppError::Unauthorized)?
            .to_string(),
    };

    let user = state.verifier.verify_id_token(&token).await?;
    tracing::debug!(uid = %user.uid, "Authenticated request");

    request.extensions_mut().insert(AuthUser {
        user,
        id_token: token,
    });

    Ok(next.run(request).await)
}
