// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore implementation of the entry store.
//!
//! Documents are nested per user: `users/{uid}/cols/{id}`, with IDs
//! generated by Firestore on insert.

use crate::db::{check_batch_size, collections, EntryStore};
use crate::error::AppError;
use crate::models::{Entry, EntryData};
use chrono::{DateTime, NaiveDate, Utc};
use futures_util::TryStreamExt;
use serde::Deserialize;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Entry document as read back from Firestore, including its document ID.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry {
    #[serde(alias = "_firestore_id")]
    id: Option<String>,
    name: String,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    distance: Option<f64>,
    #[serde(default)]
    elevation: Option<u32>,
    #[serde(default)]
    date: Option<NaiveDate>,
    lat: f64,
    lng: f64,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl StoredEntry {
    fn into_entry(self) -> Result<Entry, AppError> {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Database("Document returned without an ID".to_string()))?;

        Ok(Entry {
            id,
            data: EntryData {
                name: self.name,
                time: self.time,
                distance: self.distance,
                elevation: self.elevation,
                date: self.date,
                lat: self.lat,
                lng: self.lng,
                created_at: self.created_at,
            },
        })
    }
}

fn db_err(e: firestore::errors::FirestoreError) -> AppError {
    AppError::Database(e.to_string())
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a disconnected client; every operation fails with a database error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Parent path of a user's `cols` sub-collection.
    fn user_parent(&self, user_id: &str) -> Result<firestore::ParentPathBuilder, AppError> {
        if user_id.is_empty() {
            return Err(AppError::BadRequest("user id must not be empty".to_string()));
        }
        self.get_client()?
            .parent_path(collections::USERS, user_id)
            .map_err(db_err)
    }
}

impl EntryStore for FirestoreDb {
    async fn list(&self, user_id: &str) -> Result<Vec<Entry>, AppError> {
        let parent = self.user_parent(user_id)?;

        let docs: Vec<StoredEntry> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::COLS)
            .parent(&parent)
            .obj()
            .stream_query_with_errors()
            .await
            .map_err(db_err)?
            .try_collect()
            .await
            .map_err(db_err)?;

        tracing::debug!(user_id, count = docs.len(), "Fetched entries");

        docs.into_iter().map(StoredEntry::into_entry).collect()
    }

    async fn add(&self, user_id: &str, data: &EntryData) -> Result<String, AppError> {
        let parent = self.user_parent(user_id)?;

        let stored: StoredEntry = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::COLS)
            .generate_document_id()
            .parent(&parent)
            .object(data)
            .execute()
            .await
            .map_err(db_err)?;

        let entry = stored.into_entry()?;
        tracing::debug!(user_id, id = %entry.id, "Inserted entry");
        Ok(entry.id)
    }

    async fn set(&self, user_id: &str, id: &str, data: &EntryData) -> Result<(), AppError> {
        let parent = self.user_parent(user_id)?;

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::COLS)
            .document_id(id)
            .parent(&parent)
            .object(data)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        let parent = self.user_parent(user_id)?;

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::COLS)
            .document_id(id)
            .parent(&parent)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Delete all listed documents in a single transaction.
    async fn delete_batch(&self, user_id: &str, ids: &[String]) -> Result<(), AppError> {
        check_batch_size(ids.len())?;
        if ids.is_empty() {
            return Ok(());
        }

        let parent = self.user_parent(user_id)?;
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for id in ids {
            client
                .fluent()
                .delete()
                .from(collections::COLS)
                .document_id(id)
                .parent(&parent)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add deletion of {}: {}", id, e))
                })?;
        }

        transaction.commit().await.map_err(|e| {
            AppError::Database(format!("Failed to commit batch deletion: {}", e))
        })?;

        tracing::info!(user_id, count = ids.len(), "Batch deleted entries");
        Ok(())
    }
}
