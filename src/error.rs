// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// A destructive action was requested without the user's confirmation.
    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),

    /// The auth provider refuses a sensitive operation until the user signs in again.
    #[error("Recent sign-in required")]
    RequiresRecentLogin,

    #[error("Auth provider error: {0}")]
    Auth(String),

    #[error("Database error: {0}")]
    Database(String),

    /// An atomic batch would exceed the store's per-transaction write limit.
    #[error("Batch of {count} writes exceeds the atomic limit of {limit}")]
    BatchTooLarge { count: usize, limit: usize },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Guidance shown when the auth provider wants a fresh sign-in.
    pub const REAUTH_GUIDANCE: &'static str =
        "For security reasons, please sign out, sign in again and retry.";

    /// True for the distinguished "requires recent login" condition.
    pub fn is_requires_recent_login(&self) -> bool {
        matches!(self, AppError::RequiresRecentLogin)
    }

    /// True for failures of the remote store or auth provider that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Database(_) | AppError::Auth(_))
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::ConfirmationRequired(prompt) => (
                StatusCode::PRECONDITION_REQUIRED,
                "confirmation_required",
                Some(prompt.clone()),
            ),
            AppError::RequiresRecentLogin => (
                StatusCode::UNAUTHORIZED,
                "requires_recent_login",
                Some(Self::REAUTH_GUIDANCE.to_string()),
            ),
            AppError::Auth(msg) => {
                tracing::warn!(error = %msg, "Auth provider error");
                (StatusCode::BAD_GATEWAY, "auth_error", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::BatchTooLarge { .. } => {
                tracing::error!(error = %self, "Refusing non-atomic batch");
                (StatusCode::INTERNAL_SERVER_ERROR, "batch_too_large", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
