//! bookmarkd Core Library
//!
//! This crate provides the core functionality for bookmarkd, a self-hosted
//! bookmark manager: categories, bookmarks, their ordering, and the JSON
//! flat file they live in.
//!
//! # Architecture
//!
//! - **Tables**: In-memory category and bookmark maps, the source of truth
//! - **JSON file**: Written through on every mutation, read once at startup
//!
//! All queries are served from memory under a read lock.
//!
//! # Quick Start
//!
//! ```text
//! let store = Store::open()?;
//!
//! // Add a bookmark to a new category
//! store.create_bookmark(NewBookmark::new("https://example.com", "Example").in_category("Reading"))?;
//!
//! // Query bookmarks in display order
//! let bookmarks = store.get_bookmarks();
//! ```
//!
//! # Modules
//!
//! - `store`: Concurrency-safe storage interface (main entry point)
//! - `tables`: Table mutations and startup repair
//! - `ordering`: Contiguous position bookkeeping within a category
//! - `snapshot`: Display ordering of categories and bookmarks
//! - `models`: Data structures for categories and bookmarks
//! - `favicon`: Favicon URL derivation
//! - `storage`: JSON persistence and legacy migration
//! - `config`: Application configuration

pub mod config;
pub mod error;
pub mod favicon;
pub mod models;
pub mod ordering;
pub mod snapshot;
pub mod storage;
pub mod store;
pub mod tables;

pub use config::Config;
pub use error::{StoreError, StoreResult};
pub use models::{
    Bookmark, BookmarkPatch, Category, CategoryPatch, NewBookmark, UNCATEGORIZED_ID,
    UNCATEGORIZED_NAME,
};
pub use snapshot::BookmarkEntry;
pub use storage::{JsonPersistence, StorageError, StorageStats};
pub use store::{Store, StoreStats};
pub use tables::{Database, Tables};
