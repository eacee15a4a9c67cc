//! Data models for bookmarkd
//!
//! Defines the two persisted record types, [`Category`] and [`Bookmark`],
//! plus the partial-update patches accepted by the store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved id of the built-in category every bookmark falls back to
pub const UNCATEGORIZED_ID: &str = "uncategorized";

/// Display name of the built-in category
pub const UNCATEGORIZED_NAME: &str = "Uncategorized";

/// Maximum number of characters kept in a bookmark's notes
pub const MAX_NOTES_LEN: usize = 1000;

/// A named, ordered grouping of bookmarks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    /// Unique identifier (`uncategorized` for the built-in category)
    pub id: String,
    /// Unique, non-empty label
    pub name: String,
    /// Display rank among categories
    pub order: i64,
    /// Presentation hint, opaque to the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Category {
    /// Create a category with a fresh random id
    pub fn new(name: impl Into<String>, order: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            order,
            color: None,
        }
    }

    /// The built-in "Uncategorized" category
    pub fn uncategorized() -> Self {
        Self {
            id: UNCATEGORIZED_ID.to_string(),
            name: UNCATEGORIZED_NAME.to_string(),
            order: 0,
            color: None,
        }
    }

    /// Whether this is the built-in "Uncategorized" category
    pub fn is_uncategorized(&self) -> bool {
        self.id == UNCATEGORIZED_ID
    }
}

/// A saved URL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bookmark {
    /// Identifier derived from the URL, see [`bookmark_id`]
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// The category this bookmark belongs to; empty when missing on disk,
    /// which load-time repair re-points at "Uncategorized"
    #[serde(default)]
    pub category_id: String,
    /// Creation time, seconds since the epoch
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub favicon: String,
    /// Position within the category, starting at 0
    #[serde(default)]
    pub order: i64,
    /// Last time the bookmark was opened, seconds since the epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_visited: Option<i64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

/// Derive the bookmark id for a URL
///
/// The same URL always yields the same id (UUIDv5 in the URL namespace), so
/// saving a URL twice addresses one bookmark.
pub fn bookmark_id(url: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, url.as_bytes()).to_string()
}

/// Cut notes down to [`MAX_NOTES_LEN`] characters
pub fn truncate_notes(notes: &str) -> String {
    notes.chars().take(MAX_NOTES_LEN).collect()
}

/// Input for creating (or re-saving) a bookmark
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBookmark {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// Category name, resolved or created when `category_id` is absent
    #[serde(default)]
    pub category: Option<String>,
    /// Category id, takes precedence over `category`
    #[serde(default)]
    pub category_id: Option<String>,
    /// Favicon URL; derived from the URL host when absent
    #[serde(default)]
    pub favicon: Option<String>,
}

impl NewBookmark {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn in_category(mut self, name: impl Into<String>) -> Self {
        self.category = Some(name.into());
        self
    }

    pub fn in_category_id(mut self, id: impl Into<String>) -> Self {
        self.category_id = Some(id.into());
        self
    }
}

/// Partial update of a bookmark; unset fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookmarkPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    /// Category name, resolved or created; ignored when `category_id` is set
    #[serde(default, alias = "category_name")]
    pub category: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
}

impl BookmarkPatch {
    /// Whether this patch moves the bookmark and needs the ordering engine
    pub fn repositions(&self) -> bool {
        self.category_id.is_some() || self.category.is_some() || self.order.is_some()
    }
}

/// Partial update of a category; unset fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub color: Option<String>,
}
