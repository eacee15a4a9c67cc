//! Legacy file migration
//!
//! Older releases stored a bare JSON array of bookmarks, each carrying its
//! category as a name string. Loading such a file synthesizes the category
//! table from the names in first-seen order ("Uncategorized" pinned first)
//! and re-points every bookmark at the new category ids.

use std::collections::HashMap;

use serde::Deserialize;

use crate::models::{bookmark_id, Bookmark, Category, UNCATEGORIZED_ID, UNCATEGORIZED_NAME};
use crate::tables::Database;

/// A bookmark as stored by the legacy flat-array format
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyBookmark {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// Category name; empty means "Uncategorized"
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub favicon: String,
    #[serde(default)]
    pub order: i64,
}

/// Convert a legacy bookmark list into the current shape
pub fn migrate(legacy: Vec<LegacyBookmark>) -> Database {
    let mut categories = vec![Category::uncategorized()];
    let mut ids_by_name: HashMap<String, String> = HashMap::new();
    let mut bookmarks = Vec::with_capacity(legacy.len());

    for old in legacy {
        let name = if old.category.is_empty() {
            UNCATEGORIZED_NAME
        } else {
            old.category.as_str()
        };

        let category_id = if name == UNCATEGORIZED_NAME {
            UNCATEGORIZED_ID.to_string()
        } else if let Some(id) = ids_by_name.get(name) {
            id.clone()
        } else {
            let category = Category::new(name, categories.len() as i64);
            ids_by_name.insert(name.to_string(), category.id.clone());
            let id = category.id.clone();
            categories.push(category);
            id
        };

        let id = if old.id.is_empty() {
            bookmark_id(&old.url)
        } else {
            old.id
        };

        bookmarks.push(Bookmark {
            id,
            url: old.url,
            title: old.title,
            category_id,
            timestamp: old.timestamp,
            favicon: old.favicon,
            order: old.order,
            last_visited: None,
            notes: String::new(),
        });
    }

    Database {
        categories,
        bookmarks,
    }
}
