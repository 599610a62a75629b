// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account erasure: stored entries first, then the auth account.
//!
//! The two deletions are not atomic. If the account step fails the data is
//! already gone, and the error says so.

use crate::db::EntryStore;
use crate::error::AppError;
use crate::services::confirm::{ConfirmRequest, ConfirmationGate};
use crate::services::entry_cache::EntryCache;
use std::future::Future;

/// Deletes the signed-in user's account at the auth provider.
pub trait AccountDeleter: Send + Sync {
    /// Fails with [`AppError::RequiresRecentLogin`] when the provider wants a fresh sign-in.
    fn delete_current_account(&self) -> impl Future<Output = Result<(), AppError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErasureOutcome {
    /// The user declined; nothing was deleted.
    Cancelled,
    Erased { entries_deleted: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum ErasureError {
    /// Entry deletion failed; nothing was deleted and the account is intact.
    #[error("Failed to delete stored entries: {0}")]
    DataDeletion(#[source] AppError),

    /// Entries are deleted but the provider requires a recent sign-in.
    #[error("Entries deleted ({entries_deleted}) but account deletion requires a recent sign-in")]
    RequiresRecentLogin { entries_deleted: usize },

    /// Entries are deleted but the account deletion failed.
    #[error("Entries deleted ({entries_deleted}) but account deletion failed: {source}")]
    AccountDeletion {
        entries_deleted: usize,
        #[source]
        source: AppError,
    },
}

impl ErasureError {
    /// Message to show the user.
    pub fn user_message(&self) -> String {
        match self {
            ErasureError::DataDeletion(_) => {
                "Your data could not be deleted. Nothing was changed, please try again.".to_string()
            }
            ErasureError::RequiresRecentLogin { .. } => format!(
                "Your data has been deleted. {}",
                AppError::REAUTH_GUIDANCE
            ),
            ErasureError::AccountDeletion { .. } => {
                "Your data has been deleted but your account could not be removed. Please try again."
                    .to_string()
            }
        }
    }

    /// True once the user's entries are gone.
    pub fn data_deleted(&self) -> bool {
        !matches!(self, ErasureError::DataDeletion(_))
    }
}

impl From<ErasureError> for AppError {
    fn from(err: ErasureError) -> Self {
        match err {
            ErasureError::DataDeletion(source) => source,
            ErasureError::RequiresRecentLogin { .. } => AppError::RequiresRecentLogin,
            ErasureError::AccountDeletion { source, .. } => source,
        }
    }
}

/// Delete every entry of `user_id`, then the auth account, once `gate` confirms.
pub async fn erase_account<S, A, G>(
    cache: &EntryCache<S>,
    user_id: &str,
    accounts: &A,
    gate: &G,
) -> Result<ErasureOutcome, ErasureError>
where
    S: EntryStore,
    A: AccountDeleter,
    G: ConfirmationGate,
{
    if !gate.confirm(&ConfirmRequest::EraseAccount { user_id }).await {
        tracing::debug!(user_id, "Account erasure not confirmed");
        return Ok(ErasureOutcome::Cancelled);
    }

    let entries_deleted = cache
        .delete_all_for_user(user_id)
        .await
        .map_err(ErasureError::DataDeletion)?;

    match accounts.delete_current_account().await {
        Ok(()) => {
            tracing::info!(user_id, entries_deleted, "Account erased");
            Ok(ErasureOutcome::Erased { entries_deleted })
        }
        Err(AppError::RequiresRecentLogin) => {
            tracing::warn!(user_id, entries_deleted, "Account deletion requires recent sign-in");
            Err(ErasureError::RequiresRecentLogin { entries_deleted })
        }
        Err(source) => {
            tracing::error!(user_id, entries_deleted, error = %source, "Account deletion failed");
            Err(ErasureError::AccountDeletion {
                entries_deleted,
                source,
            })
        }
    }
}
