//! Storage errors
//!
//! Failures reading or writing `bookmarks.json`, classified so callers can
//! tell a full disk or a read-only data directory apart from a bug, and can
//! tell the user what to do about it.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by [`JsonPersistence`](super::JsonPersistence)
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Cannot create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Permission denied writing '{path}'")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No space left to save '{path}'")]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot read bookmarks file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot write '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Neither the current nor the legacy shape parsed
    #[error("Bookmarks file '{path}' is unreadable ({details}); copied to '{backup_path}'")]
    CorruptDocument {
        path: PathBuf,
        backup_path: PathBuf,
        details: String,
    },

    #[error("Cannot serialize bookmarks for '{path}': {details}")]
    InvalidFormat { path: PathBuf, details: String },

    #[error("Missing path '{path}'")]
    NotFound { path: PathBuf },

    /// The temp file was written but could not replace the bookmarks file
    #[error("Cannot replace '{to}' with '{from}': {source}")]
    AtomicWriteFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    /// Classify an I/O error on `path`
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied {
                path,
                source: error,
            },
            io::ErrorKind::NotFound => StorageError::NotFound { path },
            _ if is_disk_full_error(&error) => StorageError::DiskFull {
                path,
                source: error,
            },
            _ => StorageError::WriteError {
                path,
                source: error,
            },
        }
    }

    /// Whether fixing the environment lets a later save succeed
    ///
    /// The store keeps unsaved changes in memory, so these only need the
    /// cause removed; the next mutation writes everything out.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StorageError::DiskFull { .. }
                | StorageError::PermissionDenied { .. }
                | StorageError::CreateDirectory { .. }
                | StorageError::AtomicWriteFailed { .. }
        )
    }

    /// What the user can do about this error, if anything
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::DiskFull { .. } => {
                Some("Free up disk space; unsaved changes are written on the next save.")
            }
            StorageError::PermissionDenied { .. } => {
                Some("Make sure bookmarkd can write to its data_dir (see `bookmarkd config show`).")
            }
            StorageError::CreateDirectory { .. } => Some(
                "Point data_dir at a writable directory with `bookmarkd config set data_dir <path>`.",
            ),
            StorageError::AtomicWriteFailed { .. } => {
                Some("Remove the leftover bookmarks.tmp next to bookmarks.json and try again.")
            }
            StorageError::CorruptDocument { .. } => {
                Some("Bookmarks can be copied back by hand from the backup file.")
            }
            _ => None,
        }
    }
}

fn is_disk_full_error(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left")
        || msg.contains("disk full")
        || msg.contains("quota exceeded")
        || msg.contains("not enough space")
}

pub type StorageResult<T> = Result<T, StorageError>;
