//! Unified storage interface
//!
//! The `Store` owns the category and bookmark tables behind one read-write
//! lock, and the persistence gateway that flushes them to disk.
//!
//! ## Concurrency
//!
//! Every mutation holds the write lock for its whole duration: validate,
//! mutate, flush to disk, release. Readers take the read lock and never see a
//! half-applied change. Disk latency therefore sits inside the critical
//! section.
//!
//! ## Usage
//!
//! ```ignore
//! let store = Store::open()?;
//!
//! store.create_category("Reading", None)?;
//! store.create_bookmark(NewBookmark::new("https://a.com", "A").in_category("Reading"))?;
//!
//! let bookmarks = store.get_bookmarks();
//! ```

use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::StoreResult;
use crate::favicon;
use crate::models::{Bookmark, BookmarkPatch, Category, CategoryPatch, NewBookmark};
use crate::snapshot::BookmarkEntry;
use crate::storage::{JsonPersistence, LoadSource, StorageStats};
use crate::tables::Tables;

/// Counts and file details for status output
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub bookmarks: usize,
    pub categories: usize,
    pub storage: StorageStats,
}

/// Concurrency-safe bookmark store
///
/// Construct one per process and share it (e.g. behind an `Arc`).
pub struct Store {
    /// Both tables, guarded together
    tables: RwLock<Tables>,
    /// Flat-file persistence handler
    persistence: JsonPersistence,
    /// Configuration
    config: Config,
}

impl Store {
    /// Open the store using the default configuration
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(config)
    }

    /// Open the store with a specific configuration
    ///
    /// Loads `bookmarks.json` in the current or legacy shape and repairs the
    /// tables. Migrated or repaired data is flushed immediately.
    pub fn open_with_config(config: Config) -> Result<Self> {
        let persistence = JsonPersistence::new(config.database_path());
        let loaded = persistence
            .load()
            .context("Failed to load bookmarks file")?;

        let (tables, repaired) = match loaded.database {
            Some(db) => Tables::from_database(db),
            None => (Tables::new(), false),
        };

        if let LoadSource::Recovered { backup_path } = &loaded.source {
            warn!(
                "Starting with an empty collection; previous file kept at {:?}",
                backup_path
            );
        }

        let store = Self {
            tables: RwLock::new(tables),
            persistence,
            config,
        };

        if loaded.source == LoadSource::Legacy || repaired {
            info!(
                "Saving {} bookmarks file",
                if loaded.source == LoadSource::Legacy {
                    "migrated"
                } else {
                    "repaired"
                }
            );
            let tables = store.read();
            store
                .flush(&tables)
                .context("Failed to save migrated bookmarks")?;
        }

        Ok(store)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the bookmarks file
    pub fn path(&self) -> &Path {
        self.persistence.path()
    }

    // Mutations validate before touching the tables, so a panic elsewhere
    // cannot leave them half-updated; recover the guard from a poisoned lock.
    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a mutation under the write lock and flush it before releasing
    fn mutate<T>(&self, op: impl FnOnce(&mut Tables) -> StoreResult<T>) -> StoreResult<T> {
        let mut tables = self.write();
        let result = op(&mut tables)?;
        self.flush(&tables)?;
        Ok(result)
    }

    /// Write the tables to disk
    ///
    /// On failure the in-memory state is kept; the next successful flush
    /// writes it out.
    fn flush(&self, tables: &Tables) -> StoreResult<()> {
        match self.persistence.save(&tables.to_database()) {
            Ok(()) => {
                debug!("Flushed bookmarks to {:?}", self.persistence.path());
                Ok(())
            }
            Err(e) => {
                let hint = e.recovery_suggestion().unwrap_or("");
                if e.is_recoverable() {
                    warn!("Failed to flush bookmarks, keeping changes in memory: {} {}", e, hint);
                } else {
                    error!("Failed to flush bookmarks: {} {}", e, hint);
                }
                Err(e.into())
            }
        }
    }

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    // ==================== Bookmark Operations ====================

    /// Create a bookmark, or re-save the existing one for the same URL
    pub fn create_bookmark(&self, input: NewBookmark) -> StoreResult<Bookmark> {
        let favicon = favicon::resolve_favicon(
            &self.config.favicon_service,
            input.url.trim(),
            input.favicon.as_deref(),
        );
        self.mutate(|tables| tables.create_bookmark(input, favicon, Self::now()))
    }

    /// All bookmarks in display order
    pub fn get_bookmarks(&self) -> Vec<Bookmark> {
        self.read().sorted_bookmarks()
    }

    /// All bookmarks in display order, with category names attached
    pub fn list_bookmarks(&self) -> Vec<BookmarkEntry> {
        self.read().bookmark_entries()
    }

    /// Get a bookmark by ID
    pub fn get_bookmark(&self, id: &str) -> Option<Bookmark> {
        self.read().bookmark(id).cloned()
    }

    /// Apply a partial update to a bookmark
    pub fn update_bookmark(&self, id: &str, patch: BookmarkPatch) -> StoreResult<Bookmark> {
        self.mutate(|tables| tables.update_bookmark(id, patch))
    }

    /// Delete a bookmark
    pub fn delete_bookmark(&self, id: &str) -> StoreResult<Bookmark> {
        self.mutate(|tables| tables.delete_bookmark(id))
    }

    /// Record that a bookmark was just opened
    pub fn record_visit(&self, id: &str) -> StoreResult<Bookmark> {
        self.mutate(|tables| tables.record_visit(id, Self::now()))
    }

    // ==================== Category Operations ====================

    /// All categories in display order
    pub fn get_categories(&self) -> Vec<Category> {
        self.read().sorted_categories()
    }

    /// Create a category
    pub fn create_category(&self, name: &str, color: Option<String>) -> StoreResult<Category> {
        self.mutate(|tables| tables.create_category(name, color))
    }

    /// Update the category currently called `old_name`
    pub fn update_category(&self, old_name: &str, patch: CategoryPatch) -> StoreResult<Category> {
        self.mutate(|tables| tables.update_category(old_name, patch))
    }

    /// Delete a category; its bookmarks move to "Uncategorized"
    pub fn delete_category(&self, name: &str) -> StoreResult<Category> {
        self.mutate(|tables| tables.delete_category(name))
    }

    /// Assign each listed category the order of its position in `ids`
    pub fn reorder_categories(&self, ids: &[String]) -> StoreResult<()> {
        self.mutate(|tables| tables.reorder_categories(ids))
    }

    // ==================== Stats ====================

    /// Counts and file details
    pub fn stats(&self) -> StoreStats {
        let tables = self.read();
        StoreStats {
            bookmarks: tables.bookmark_count(),
            categories: tables.category_count(),
            storage: self.persistence.stats(),
        }
    }
}
