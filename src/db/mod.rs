//! Database layer (remote document store).
//!
//! Entries live in a per-user sub-collection: `users/{uid}/cols/{id}`.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{Entry, EntryData};
use std::future::Future;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Per-user entries, nested under `users/{uid}`
    pub const COLS: &str = "cols";
}

/// Documents the store can delete in one atomic commit.
pub const MAX_ATOMIC_WRITES: usize = 500;

/// Per-user document collection operations the entry cache relies on.
///
/// Implementations must give read-your-writes consistency: a `list` issued
/// after a successful write observes that write.
pub trait EntryStore: Send + Sync + 'static {
    /// Fetch every entry of a user.
    fn list(&self, user_id: &str) -> impl Future<Output = Result<Vec<Entry>, AppError>> + Send;

    /// Create a document and return its store-assigned ID.
    fn add(
        &self,
        user_id: &str,
        data: &EntryData,
    ) -> impl Future<Output = Result<String, AppError>> + Send;

    /// Overwrite a whole document.
    fn set(
        &self,
        user_id: &str,
        id: &str,
        data: &EntryData,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn delete(&self, user_id: &str, id: &str)
        -> impl Future<Output = Result<(), AppError>> + Send;

    /// Delete documents all-or-nothing.
    ///
    /// Batches over [`MAX_ATOMIC_WRITES`] are refused with
    /// [`AppError::BatchTooLarge`] rather than split.
    fn delete_batch(
        &self,
        user_id: &str,
        ids: &[String],
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

pub(crate) fn check_batch_size(count: usize) -> Result<(), AppError> {
    if count > MAX_ATOMIC_WRITES {
        return Err(AppError::BatchTooLarge {
            count,
            limit: MAX_ATOMIC_WRITES,
        });
    }
    Ok(())
}
