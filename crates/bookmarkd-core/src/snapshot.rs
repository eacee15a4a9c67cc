//! Deterministic listings of the tables
//!
//! Categories sort "Uncategorized" first, then by ascending `order`.
//! Bookmarks sort by their category's position, then by their own `order`,
//! newest first on ties. Remaining ties fall back to name/id so the output
//! is a total order.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::models::{Bookmark, Category, UNCATEGORIZED_NAME};

/// Sort key of a category: built-in category first, then by order
fn category_rank(category: &Category) -> (i8, i64) {
    (if category.is_uncategorized() { -1 } else { 0 }, category.order)
}

fn compare_categories(a: &Category, b: &Category) -> Ordering {
    category_rank(a)
        .cmp(&category_rank(b))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

/// All categories in display order
pub fn sorted_categories(categories: &HashMap<String, Category>) -> Vec<Category> {
    let mut result: Vec<Category> = categories.values().cloned().collect();
    result.sort_by(compare_categories);
    result
}

/// All bookmarks in display order
pub fn sorted_bookmarks(
    categories: &HashMap<String, Category>,
    bookmarks: &HashMap<String, Bookmark>,
) -> Vec<Bookmark> {
    // Position of each category in the sorted category list
    let positions: HashMap<&str, usize> = {
        let mut cats: Vec<&Category> = categories.values().collect();
        cats.sort_by(|a, b| compare_categories(a, b));
        cats.into_iter()
            .enumerate()
            .map(|(i, cat)| (cat.id.as_str(), i))
            .collect()
    };
    // Dangling references sort last
    let position = |bookmark: &Bookmark| {
        positions
            .get(bookmark.category_id.as_str())
            .copied()
            .unwrap_or(usize::MAX)
    };

    let mut result: Vec<Bookmark> = bookmarks.values().cloned().collect();
    result.sort_by(|a, b| {
        position(a)
            .cmp(&position(b))
            .then_with(|| a.order.cmp(&b.order))
            .then_with(|| b.timestamp.cmp(&a.timestamp))
            .then_with(|| a.id.cmp(&b.id))
    });
    result
}

/// A bookmark as listed by the API, with its category's name attached
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BookmarkEntry {
    #[serde(flatten)]
    pub bookmark: Bookmark,
    /// Name of the bookmark's category
    pub category: String,
}

/// Sorted bookmarks annotated with their category names
pub fn bookmark_entries(
    categories: &HashMap<String, Category>,
    bookmarks: &HashMap<String, Bookmark>,
) -> Vec<BookmarkEntry> {
    sorted_bookmarks(categories, bookmarks)
        .into_iter()
        .map(|bookmark| {
            let category = categories
                .get(&bookmark.category_id)
                .map(|cat| cat.name.clone())
                .unwrap_or_else(|| UNCATEGORIZED_NAME.to_string());
            BookmarkEntry { bookmark, category }
        })
        .collect()
}
