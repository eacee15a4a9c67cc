//! Store error taxonomy
//!
//! Every store operation reports failures through [`StoreError`]. Validation
//! errors are raised before any table is touched; a [`StoreError::Persistence`]
//! is raised after the in-memory mutation has already been applied.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors returned by [`crate::Store`] operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Referenced bookmark or category does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Category name already taken
    #[error("{0}")]
    Conflict(String),

    /// Attempt to rename or delete the built-in category
    #[error("{0}")]
    Forbidden(String),

    /// Malformed or incomplete request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Flushing to disk failed; the in-memory change is kept
    #[error("Failed to persist bookmarks: {0}")]
    Persistence(#[from] StorageError),
}

impl StoreError {
    pub(crate) fn bookmark_not_found(id: &str) -> Self {
        StoreError::NotFound(format!("Bookmark '{}'", id))
    }

    pub(crate) fn category_not_found(key: &str) -> Self {
        StoreError::NotFound(format!("Category '{}'", key))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
