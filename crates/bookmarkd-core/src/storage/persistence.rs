//! Flat-file persistence
//!
//! The whole collection lives in one pretty-printed JSON document,
//! `bookmarks.json`, holding `categories` and `bookmarks` lists. Every save
//! rewrites the file through an atomic write (temp file, fsync, rename), so a
//! crash mid-save leaves the previous version intact.
//!
//! Loading accepts the current shape, falls back to the legacy flat bookmark
//! array, and as a last resort backs up an unreadable file and starts empty.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, warn};

use super::error::{StorageError, StorageResult};
use super::migration::{self, LegacyBookmark};
use crate::tables::Database;

/// Where a loaded database came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    /// No file yet; fresh tables
    Fresh,
    /// Parsed in the current shape
    Current,
    /// Migrated from the legacy flat-array shape; should be saved right away
    Legacy,
    /// File was unreadable; it was copied to `backup_path` and tables start fresh
    Recovered { backup_path: PathBuf },
}

/// Result of [`JsonPersistence::load`]
#[derive(Debug)]
pub struct Loaded {
    /// `None` when starting fresh
    pub database: Option<Database>,
    pub source: LoadSource,
}

/// File statistics for status output
#[derive(Debug, Clone, Default)]
pub struct StorageStats {
    /// Whether the bookmarks file exists
    pub file_exists: bool,
    /// Size of the bookmarks file in bytes
    pub file_size: u64,
}

impl StorageStats {
    /// Format the file size in human-readable form
    pub fn file_size_human(&self) -> String {
        let size = self.file_size;
        if size < 1024 {
            format!("{} B", size)
        } else if size < 1024 * 1024 {
            format!("{:.1} KB", size as f64 / 1024.0)
        } else {
            format!("{:.1} MB", size as f64 / (1024.0 * 1024.0))
        }
    }
}

/// Persistence gateway for the bookmarks file
#[derive(Debug, Clone)]
pub struct JsonPersistence {
    path: PathBuf,
}

impl JsonPersistence {
    /// Create a persistence handler for the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the bookmarks file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the bookmarks file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Free path to preserve an unreadable file
    ///
    /// `bookmarks.json.corrupt.<UTC timestamp>.backup`, with a `-N` counter
    /// before `.backup` when that name is already taken, so earlier backups
    /// are never overwritten.
    pub fn backup_path(&self) -> PathBuf {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S").to_string();
        let mut attempt: u32 = 0;
        loop {
            let mut name = self.path.as_os_str().to_owned();
            name.push(format!(".corrupt.{}", stamp));
            if attempt > 0 {
                name.push(format!("-{}", attempt));
            }
            name.push(".backup");
            let candidate = PathBuf::from(name);
            if !candidate.exists() {
                return candidate;
            }
            attempt += 1;
        }
    }

    /// Serialize and atomically write the database
    pub fn save(&self, db: &Database) -> StorageResult<()> {
        let json = serde_json::to_vec_pretty(db).map_err(|e| StorageError::InvalidFormat {
            path: self.path.clone(),
            details: e.to_string(),
        })?;
        atomic_write(&self.path, &json)
    }

    /// Load the database in whichever shape the file holds
    pub fn load(&self) -> StorageResult<Loaded> {
        if !self.path.exists() {
            info!("No bookmarks file at {:?}, starting fresh", self.path);
            return Ok(Loaded {
                database: None,
                source: LoadSource::Fresh,
            });
        }

        let bytes = fs::read(&self.path).map_err(|source| StorageError::ReadError {
            path: self.path.clone(),
            source,
        })?;

        let current_err = match serde_json::from_slice::<Database>(&bytes) {
            Ok(db) => {
                info!(
                    "Loaded {} categories and {} bookmarks from {:?}",
                    db.categories.len(),
                    db.bookmarks.len(),
                    self.path
                );
                return Ok(Loaded {
                    database: Some(db),
                    source: LoadSource::Current,
                });
            }
            Err(e) => e,
        };

        if let Ok(legacy) = serde_json::from_slice::<Vec<LegacyBookmark>>(&bytes) {
            info!(
                "Migrating {} bookmarks from legacy format in {:?}",
                legacy.len(),
                self.path
            );
            return Ok(Loaded {
                database: Some(migration::migrate(legacy)),
                source: LoadSource::Legacy,
            });
        }

        let backup_path = self.backup_path();
        fs::copy(&self.path, &backup_path)
            .map_err(|e| StorageError::from_io(e, backup_path.clone()))?;
        let err = StorageError::CorruptDocument {
            path: self.path.clone(),
            backup_path: backup_path.clone(),
            details: current_err.to_string(),
        };
        warn!("{}", err);

        Ok(Loaded {
            database: None,
            source: LoadSource::Recovered { backup_path },
        })
    }

    /// Get file statistics
    pub fn stats(&self) -> StorageStats {
        let file_size = fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);
        StorageStats {
            file_exists: self.exists(),
            file_size,
        }
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    // Same directory, so the rename stays on one filesystem
    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewBookmark, UNCATEGORIZED_ID};
    use crate::tables::Tables;
    use tempfile::TempDir;

    fn persistence(temp_dir: &TempDir) -> JsonPersistence {
        JsonPersistence::new(temp_dir.path().join("bookmarks.json"))
    }

    #[test]
    fn test_load_missing_file_is_fresh() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = persistence(&temp_dir);

        assert!(!persistence.exists());
        let loaded = persistence.load().unwrap();
        assert_eq!(loaded.source, LoadSource::Fresh);
        assert!(loaded.database.is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = persistence(&temp_dir);

        let mut tables = Tables::new();
        tables.create_category("Reading", Some("#112233".into())).unwrap();
        tables
            .create_bookmark(
                NewBookmark::new("https://a.com", "A").in_category("Reading"),
                "https://icons/a".to_string(),
                1_700_000_000,
            )
            .unwrap();
        let db = tables.to_database();

        persistence.save(&db).unwrap();
        assert!(persistence.exists());

        let loaded = persistence.load().unwrap();
        assert_eq!(loaded.source, LoadSource::Current);
        assert_eq!(loaded.database.unwrap(), db);
    }

    #[test]
    fn test_saved_file_shape() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = persistence(&temp_dir);

        let mut tables = Tables::new();
        tables
            .create_bookmark(
                NewBookmark::new("https://a.com", "A"),
                String::new(),
                1_700_000_000,
            )
            .unwrap();
        persistence.save(&tables.to_database()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(persistence.path()).unwrap()).unwrap();
        assert_eq!(raw["categories"][0]["id"], UNCATEGORIZED_ID);
        assert_eq!(raw["bookmarks"][0]["url"], "https://a.com");
        assert_eq!(raw["bookmarks"][0]["category_id"], UNCATEGORIZED_ID);
        assert_eq!(raw["bookmarks"][0]["order"], 0);
    }

    #[test]
    fn test_load_legacy_array() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = persistence(&temp_dir);

        fs::write(
            persistence.path(),
            r#"[
                {"id": "1", "url": "https://w.com", "title": "W", "category": "Work", "timestamp": 1, "favicon": "", "order": 0},
                {"id": "2", "url": "https://u.com", "title": "U", "category": "Uncategorized", "timestamp": 2, "favicon": "", "order": 0}
            ]"#,
        )
        .unwrap();

        let loaded = persistence.load().unwrap();
        assert_eq!(loaded.source, LoadSource::Legacy);
        let db = loaded.database.unwrap();
        assert_eq!(db.categories.len(), 2);
        assert_eq!(db.bookmarks.len(), 2);
    }

    #[test]
    fn test_load_corrupt_file_backs_up() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = persistence(&temp_dir);

        fs::write(persistence.path(), "{ not json").unwrap();

        let loaded = persistence.load().unwrap();
        assert!(loaded.database.is_none());
        match loaded.source {
            LoadSource::Recovered { backup_path } => {
                let name = backup_path.file_name().unwrap().to_string_lossy().into_owned();
                assert!(name.starts_with("bookmarks.json.corrupt."), "{}", name);
                assert!(name.ends_with(".backup"), "{}", name);
                assert_eq!(fs::read_to_string(backup_path).unwrap(), "{ not json");
            }
            other => panic!("expected recovery, got {:?}", other),
        }
    }

    #[test]
    fn test_repeated_corruption_keeps_every_backup() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = persistence(&temp_dir);

        let mut backups = Vec::new();
        for content in ["first garbage", "second garbage"] {
            fs::write(persistence.path(), content).unwrap();
            match persistence.load().unwrap().source {
                LoadSource::Recovered { backup_path } => backups.push(backup_path),
                other => panic!("expected recovery, got {:?}", other),
            }
        }

        assert_ne!(backups[0], backups[1]);
        assert_eq!(fs::read_to_string(&backups[0]).unwrap(), "first garbage");
        assert_eq!(fs::read_to_string(&backups[1]).unwrap(), "second garbage");
    }

    #[test]
    fn test_bookmark_without_category_id_still_loads() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = persistence(&temp_dir);

        fs::write(
            persistence.path(),
            r#"{
                "categories": [{"id": "uncategorized", "name": "Uncategorized", "order": 0}],
                "bookmarks": [
                    {"id": "a", "url": "https://a.com", "title": "A", "order": 0},
                    {"id": "b", "url": "https://b.com", "title": "B", "category_id": "uncategorized", "order": 0}
                ]
            }"#,
        )
        .unwrap();

        let loaded = persistence.load().unwrap();
        assert_eq!(loaded.source, LoadSource::Current);
        let db = loaded.database.unwrap();
        assert_eq!(db.bookmarks.len(), 2);
        assert!(db.bookmarks.iter().any(|b| b.category_id.is_empty()));
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir
            .path()
            .join("a")
            .join("b")
            .join("bookmarks.json");

        atomic_write(&nested_path, b"{}").unwrap();

        assert!(nested_path.exists());
        assert!(!nested_path.with_extension("tmp").exists());
        assert_eq!(fs::read_to_string(&nested_path).unwrap(), "{}");
    }

    #[test]
    fn test_stats() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = persistence(&temp_dir);

        let stats = persistence.stats();
        assert!(!stats.file_exists);
        assert_eq!(stats.file_size, 0);

        persistence.save(&Tables::new().to_database()).unwrap();
        let stats = persistence.stats();
        assert!(stats.file_exists);
        assert!(stats.file_size > 0);
        assert!(stats.file_size_human().ends_with('B'));
    }
}
