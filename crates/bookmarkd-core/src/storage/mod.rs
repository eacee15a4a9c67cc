//! Storage layer
//!
//! Persists the category and bookmark tables to a single JSON file.
//!
//! - `persistence`: atomic save, load with shape detection and recovery
//! - `migration`: conversion from the legacy flat bookmark array
//! - `error`: typed storage errors

pub mod error;
pub mod migration;
pub mod persistence;

pub use error::{StorageError, StorageResult};
pub use persistence::{JsonPersistence, LoadSource, Loaded, StorageStats};
