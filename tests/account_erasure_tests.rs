// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account erasure ordering and partial-failure reporting.

use cyclology::db::memory::StoreOp;
use cyclology::db::MemoryStore;
use cyclology::error::AppError;
use cyclology::services::{
    erase_account, AccountDeleter, EntryCache, ErasureError, ErasureOutcome, IdentityToolkit,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

mod common;
use common::col;

/// Account deleter with a scripted answer that counts its calls.
struct FakeAccounts {
    calls: AtomicUsize,
    answer: fn() -> Result<(), AppError>,
}

impl FakeAccounts {
    fn new(answer: fn() -> Result<(), AppError>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            answer,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AccountDeleter for FakeAccounts {
    async fn delete_current_account(&self) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.answer)()
    }
}

async fn signed_in_cache(entries: usize) -> (Arc<MemoryStore>, EntryCache<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    for n in 0..entries {
        store.seed("u1", col(&format!("Col {n}"), 45.0, 6.0));
    }
    let cache = EntryCache::new(store.clone());
    cache.load("u1").await.unwrap();
    (store, cache)
}

#[tokio::test]
async fn test_refused_confirmation_deletes_nothing() {
    let (store, cache) = signed_in_cache(2).await;
    let accounts = FakeAccounts::new(|| Ok(()));
    let calls = store.total_calls();

    let outcome = erase_account(&cache, "u1", &accounts, &false).await.unwrap();

    assert_eq!(outcome, ErasureOutcome::Cancelled);
    assert_eq!(store.total_calls(), calls);
    assert_eq!(accounts.calls(), 0);
    assert_eq!(cache.snapshot().len(), 2);
}

#[tokio::test]
async fn test_erases_data_then_account() {
    let (store, cache) = signed_in_cache(3).await;
    let accounts = FakeAccounts::new(|| Ok(()));

    let outcome = erase_account(&cache, "u1", &accounts, &true).await.unwrap();

    assert_eq!(outcome, ErasureOutcome::Erased { entries_deleted: 3 });
    assert_eq!(store.count("u1"), 0);
    assert!(cache.snapshot().is_empty());
    assert_eq!(accounts.calls(), 1);
}

#[tokio::test]
async fn test_data_failure_keeps_account() {
    let (store, cache) = signed_in_cache(2).await;
    store.fail_next(StoreOp::DeleteBatch, 1);
    let accounts = FakeAccounts::new(|| Ok(()));

    let err = erase_account(&cache, "u1", &accounts, &true)
        .await
        .unwrap_err();

    assert!(matches!(err, ErasureError::DataDeletion(_)));
    assert!(!err.data_deleted());
    assert_eq!(accounts.calls(), 0);
    assert_eq!(store.count("u1"), 2);
}

#[tokio::test]
async fn test_stale_login_reports_reauth_guidance() {
    let (store, cache) = signed_in_cache(2).await;
    let accounts = FakeAccounts::new(|| Err(AppError::RequiresRecentLogin));

    let err = erase_account(&cache, "u1", &accounts, &true)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ErasureError::RequiresRecentLogin { entries_deleted: 2 }
    ));
    assert!(err.user_message().contains(AppError::REAUTH_GUIDANCE));
    assert_eq!(store.count("u1"), 0);
}

#[tokio::test]
async fn test_other_account_failure_is_generic() {
    let (_store, cache) = signed_in_cache(1).await;
    let accounts = FakeAccounts::new(|| Err(AppError::Auth("HTTP 500".to_string())));

    let err = erase_account(&cache, "u1", &accounts, &true)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ErasureError::AccountDeletion {
            entries_deleted: 1,
            ..
        }
    ));
    assert!(err.data_deleted());
    assert!(!err.user_message().contains(AppError::REAUTH_GUIDANCE));
}

#[tokio::test]
async fn test_user_without_entries_still_deletes_account() {
    let (store, cache) = signed_in_cache(0).await;
    let accounts = FakeAccounts::new(|| Ok(()));

    let outcome = erase_account(&cache, "u1", &accounts, &true).await.unwrap();

    assert_eq!(outcome, ErasureOutcome::Erased { entries_deleted: 0 });
    assert_eq!(store.calls(StoreOp::DeleteBatch), 0);
    assert_eq!(accounts.calls(), 1);
}

async fn delete_via_toolkit(failure: Option<&'static str>, key: &str) -> Result<(), AppError> {
    let base_url = common::fake_identity_toolkit(failure).await;
    IdentityToolkit::with_base_url(&base_url, key)
        .current_account("id-token".to_string())
        .delete_current_account()
        .await
}

#[tokio::test]
async fn test_identity_toolkit_error_mapping() {
    assert!(delete_via_toolkit(None, "test_api_key").await.is_ok());
    assert!(matches!(
        delete_via_toolkit(Some("CREDENTIAL_TOO_OLD_LOGIN_AGAIN"), "test_api_key").await,
        Err(AppError::RequiresRecentLogin)
    ));
    assert!(matches!(
        delete_via_toolkit(Some("INVALID_ID_TOKEN : revoked"), "test_api_key").await,
        Err(AppError::InvalidToken)
    ));
    assert!(matches!(
        delete_via_toolkit(Some("INTERNAL_ERROR"), "test_api_key").await,
        Err(AppError::Auth(_))
    ));
    assert!(matches!(
        delete_via_toolkit(None, "nope").await,
        Err(AppError::Auth(_))
    ));
}
