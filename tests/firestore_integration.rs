// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Run with FIRESTORE_EMULATOR_HOST pointing at it.
//!
//! The emulator provides a clean state for each test run.

use chrono::TimeZone;
use cyclology::db::{EntryStore, FirestoreDb};
use cyclology::error::AppError;
use cyclology::services::{EntryCache, LoadOutcome, WriteOutcome};
use std::sync::Arc;

mod common;
use common::{col, test_db};

/// Generate a unique user ID for test isolation.
fn unique_uid() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("test-user-{nanos}")
}

// ═══════════════════════════════════════════════════════════════════════════
// STORE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_add_list_and_full_overwrite() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid();

    assert!(db.list(&uid).await.unwrap().is_empty());

    let mut data = col("Col du Tourmalet", 42.9083, 0.1214);
    data.date = chrono::NaiveDate::from_ymd_opt(2024, 7, 14);
    data.created_at = Some(chrono::Utc.with_ymd_and_hms(2024, 7, 14, 18, 0, 0).unwrap());
    let id = db.add(&uid, &data).await.unwrap();
    assert!(!id.is_empty());

    let listed = db.list(&uid).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
    assert_eq!(listed[0].data, data);

    // `set` replaces the whole document: cleared fields must disappear.
    let mut revised = data.clone();
    revised.elevation = Some(1450);
    revised.time = None;
    db.set(&uid, &id, &revised).await.unwrap();

    let listed = db.list(&uid).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].data.elevation, Some(1450));
    assert_eq!(listed[0].data.time, None);
}

#[tokio::test]
async fn test_users_are_isolated() {
    require_emulator!();

    let db = test_db().await;
    let alice = unique_uid();
    let bob = unique_uid();

    db.add(&alice, &col("Col du Galibier", 45.06, 6.41))
        .await
        .unwrap();

    assert_eq!(db.list(&alice).await.unwrap().len(), 1);
    assert!(db.list(&bob).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_and_batch_delete() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid();

    let mut ids = Vec::new();
    for name in ["Col du Galibier", "Col d'Izoard", "Col de l'Iseran"] {
        ids.push(db.add(&uid, &col(name, 45.0, 6.5)).await.unwrap());
    }

    db.delete(&uid, &ids[0]).await.unwrap();
    assert_eq!(db.list(&uid).await.unwrap().len(), 2);

    db.delete_batch(&uid, &ids[1..]).await.unwrap();
    assert!(db.list(&uid).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_oversized_batch_is_refused_before_writing() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid();
    let id = db
        .add(&uid, &col("Col de la Madeleine", 45.43, 6.40))
        .await
        .unwrap();

    let mut ids: Vec<String> = (0..cyclology::db::MAX_ATOMIC_WRITES)
        .map(|n| format!("missing-{n}"))
        .collect();
    ids.push(id);

    let result = db.delete_batch(&uid, &ids).await;
    assert!(matches!(result, Err(AppError::BatchTooLarge { .. })));
    assert_eq!(db.list(&uid).await.unwrap().len(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// CACHE OVER FIRESTORE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_cache_round_trip_through_firestore() {
    require_emulator!();

    let db = Arc::new(test_db().await);
    let uid = unique_uid();
    let cache = EntryCache::new(db.clone());

    assert_eq!(cache.load(&uid).await.unwrap(), LoadOutcome::Applied(0));

    let WriteOutcome::Saved(id) = cache
        .add(&col("Mont Ventoux", 44.1745, 5.2742))
        .await
        .unwrap()
    else {
        panic!("cache should be bound");
    };
    assert_eq!(cache.snapshot().len(), 1);
    assert_eq!(cache.snapshot()[0].id, id);

    assert_eq!(cache.delete_all_for_user(&uid).await.unwrap(), 1);
    assert!(cache.snapshot().is_empty());
    assert!(db.list(&uid).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_offline_client_fails_with_database_error() {
    let db = FirestoreDb::new_mock();

    assert!(matches!(
        db.list("anyone").await,
        Err(AppError::Database(_))
    ));
}
