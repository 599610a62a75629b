// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::db::EntryStore;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::known_col::{self, KnownCol};
use crate::models::EntryForm;
use crate::services::{
    erase_account, ConfirmRequest, DeleteOutcome, ErasureOutcome, ListRow, SessionUser,
    WriteOutcome,
};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via Firebase ID token).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes<S: EntryStore>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route("/api/me", get(get_me::<S>))
        .route("/api/cols", get(list_cols::<S>).post(add_col::<S>))
        .route("/api/cols/map", get(map_cols::<S>))
        .route("/api/cols/{id}", put(update_col::<S>).delete(delete_col::<S>))
        .route("/api/known-cols", get(known_cols))
        .route("/api/session/signout", post(sign_out::<S>))
        .route("/api/account", delete(delete_account::<S>))
}

/// `?confirm=true` on destructive requests.
#[derive(Debug, Default, Deserialize)]
struct ConfirmQuery {
    #[serde(default)]
    confirm: bool,
}

// ─── Session ─────────────────────────────────────────────────

/// Get the signed-in user.
async fn get_me<S: EntryStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(auth): Extension<AuthUser>,
) -> Json<SessionUser> {
    state.sessions.open(&auth.user).await;
    Json(auth.user)
}

/// Deliver the signed-out signal for this user's session.
async fn sign_out<S: EntryStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(auth): Extension<AuthUser>,
) -> StatusCode {
    state.sessions.close(auth.uid()).await;
    StatusCode::NO_CONTENT
}

// ─── Cols ────────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ColsResponse {
    pub cols: Vec<ListRow>,
    pub total: usize,
}

/// The rendered cols list, newest first.
async fn list_cols<S: EntryStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(auth): Extension<AuthUser>,
) -> Json<ColsResponse> {
    let session = state.sessions.open(&auth.user).await;
    let cols = session.list.rows().as_ref().clone();

    Json(ColsResponse {
        total: cols.len(),
        cols,
    })
}

/// Map markers as a GeoJSON feature collection.
async fn map_cols<S: EntryStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(auth): Extension<AuthUser>,
) -> Json<FeatureCollection> {
    let session = state.sessions.open(&auth.user).await;
    Json(session.map.markers().as_ref().clone())
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SavedResponse {
    pub id: String,
}

fn saved(outcome: WriteOutcome) -> Result<Json<SavedResponse>> {
    match outcome {
        WriteOutcome::Saved(id) => Ok(Json(SavedResponse { id })),
        // The session was signed out while the request was in flight.
        WriteOutcome::NotBound => Err(AppError::Unauthorized),
    }
}

/// Record a new ascent.
async fn add_col<S: EntryStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(auth): Extension<AuthUser>,
    Json(form): Json<EntryForm>,
) -> Result<(StatusCode, Json<SavedResponse>)> {
    let now = Utc::now();
    let data = form.into_data(now.date_naive(), now)?;

    let session = state.sessions.open(&auth.user).await;
    let outcome = session.cache().add(&data).await?;

    Ok((StatusCode::CREATED, saved(outcome)?))
}

/// Replace an ascent. The original creation time is kept.
async fn update_col<S: EntryStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(form): Json<EntryForm>,
) -> Result<Json<SavedResponse>> {
    let now = Utc::now();
    let mut data = form.into_data(now.date_naive(), now)?;

    let session = state.sessions.open(&auth.user).await;
    let cache = session.cache();
    if let Some(existing) = cache.snapshot().iter().find(|e| e.id == id) {
        data.created_at = existing.data.created_at.or(data.created_at);
    }

    saved(cache.update(&id, &data).await?)
}

/// Delete an ascent. Needs `?confirm=true`.
async fn delete_col<S: EntryStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Query(params): Query<ConfirmQuery>,
) -> Result<StatusCode> {
    let session = state.sessions.open(&auth.user).await;
    let cache = session.cache();

    match cache.delete(&id, &params.confirm).await? {
        DeleteOutcome::Deleted => Ok(StatusCode::NO_CONTENT),
        DeleteOutcome::NotFound => Err(AppError::NotFound(format!("Col {} not found", id))),
        DeleteOutcome::Cancelled => {
            let prompt = cache
                .snapshot()
                .iter()
                .find(|e| e.id == id)
                .map(|entry| ConfirmRequest::DeleteEntry(entry).prompt())
                .unwrap_or_default();
            Err(AppError::ConfirmationRequired(prompt))
        }
    }
}

#[derive(Debug, Deserialize)]
struct KnownColsQuery {
    #[serde(default)]
    q: String,
}

/// Autocomplete suggestions for the col name field.
async fn known_cols(Query(params): Query<KnownColsQuery>) -> Json<Vec<KnownCol>> {
    Json(known_col::suggest(&params.q))
}

// ─── Account Deletion ────────────────────────────────────────

/// Response for account deletion.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub entries_deleted: usize,
    pub message: String,
}

/// Delete every recorded col, then the Firebase account. Needs `?confirm=true`.
async fn delete_account<S: EntryStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<ConfirmQuery>,
) -> Result<Json<DeleteAccountResponse>> {
    tracing::info!(uid = %auth.uid(), "User-initiated account deletion");

    let session = state.sessions.open(&auth.user).await;
    let account = state.accounts.current_account(auth.id_token.clone());

    let outcome = match erase_account(session.cache(), auth.uid(), &account, &params.confirm).await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(
                uid = %auth.uid(),
                data_deleted = e.data_deleted(),
                error = %e,
                "Account erasure incomplete"
            );
            // Deleting the data unbinds the cache; the account survives, so the
            // next request must open a fresh session.
            state.sessions.close(auth.uid()).await;
            return Err(AppError::from(e));
        }
    };

    match outcome {
        ErasureOutcome::Cancelled => Err(AppError::ConfirmationRequired(
            ConfirmRequest::EraseAccount {
                user_id: auth.uid(),
            }
            .prompt(),
        )),
        ErasureOutcome::Erased { entries_deleted } => {
            state.sessions.close(auth.uid()).await;
            Ok(Json(DeleteAccountResponse {
                success: true,
                entries_deleted,
                message: "Your account and all recorded cols have been deleted.".to_string(),
            }))
        }
    }
}
