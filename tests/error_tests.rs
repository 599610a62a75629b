// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use cyclology::error::AppError;
use serde_json::Value;

async fn body_of(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[test]
fn test_requires_recent_login_matches() {
    assert!(AppError::RequiresRecentLogin.is_requires_recent_login());
    assert!(!AppError::InvalidToken.is_requires_recent_login());
    assert!(!AppError::Auth("CREDENTIAL_TOO_OLD".to_string()).is_requires_recent_login());
}

#[test]
fn test_transient_errors() {
    assert!(AppError::Database("unavailable".to_string()).is_transient());
    assert!(AppError::Auth("HTTP 503".to_string()).is_transient());
    assert!(!AppError::BadRequest("name".to_string()).is_transient());
    assert!(!AppError::RequiresRecentLogin.is_transient());
}

#[tokio::test]
async fn test_reauth_response_carries_guidance() {
    let (status, body) = body_of(AppError::RequiresRecentLogin).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "requires_recent_login");
    assert_eq!(body["details"], AppError::REAUTH_GUIDANCE);
}

#[tokio::test]
async fn test_internal_details_are_not_leaked() {
    let (status, body) =
        body_of(AppError::Database("connection reset by 10.0.0.3".to_string())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());

    let (status, body) = body_of(AppError::BatchTooLarge {
        count: 501,
        limit: 500,
    })
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "batch_too_large");
}

#[tokio::test]
async fn test_confirmation_required_is_428() {
    let (status, body) = body_of(AppError::ConfirmationRequired("Sure?".to_string())).await;

    assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);
    assert_eq!(body["details"], "Sure?");
}
