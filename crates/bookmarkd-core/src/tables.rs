//! Category and bookmark tables
//!
//! [`Tables`] owns both id-keyed maps and is the only place that changes a
//! bookmark's `category_id` or `order`; every such change goes through the
//! [`ordering`](crate::ordering) functions. Each operation validates first and
//! mutates second, so an error leaves the tables untouched.
//!
//! Lookups by name and "max order in category" are linear scans.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::models::{
    bookmark_id, truncate_notes, Bookmark, BookmarkPatch, Category, CategoryPatch, NewBookmark,
    UNCATEGORIZED_ID, UNCATEGORIZED_NAME,
};
use crate::ordering;
use crate::snapshot;

/// On-disk shape: both tables as sorted lists
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Database {
    pub categories: Vec<Category>,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
}

/// The in-memory category and bookmark tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    categories: HashMap<String, Category>,
    bookmarks: HashMap<String, Bookmark>,
}

impl Default for Tables {
    fn default() -> Self {
        Self::new()
    }
}

impl Tables {
    /// Empty tables holding only "Uncategorized"
    pub fn new() -> Self {
        let mut categories = HashMap::new();
        let uncategorized = Category::uncategorized();
        categories.insert(uncategorized.id.clone(), uncategorized);
        Self {
            categories,
            bookmarks: HashMap::new(),
        }
    }

    /// Build tables from a loaded database
    ///
    /// Returns the tables and whether a repair was needed (see [`Tables::repair`]).
    pub fn from_database(db: Database) -> (Self, bool) {
        let mut tables = Self {
            categories: db
                .categories
                .into_iter()
                .map(|c| (c.id.clone(), c))
                .collect(),
            bookmarks: db
                .bookmarks
                .into_iter()
                .map(|b| (b.id.clone(), b))
                .collect(),
        };
        let repaired = tables.repair();
        (tables, repaired)
    }

    /// Snapshot both tables in display order
    pub fn to_database(&self) -> Database {
        Database {
            categories: self.sorted_categories(),
            bookmarks: self.sorted_bookmarks(),
        }
    }

    /// Restore the table invariants on freshly loaded data
    ///
    /// Ensures "Uncategorized" exists, re-points dangling bookmarks to it and
    /// renumbers every category to `0..n-1`. Returns whether anything changed.
    pub fn repair(&mut self) -> bool {
        let mut changed = false;

        match self.categories.get_mut(UNCATEGORIZED_ID) {
            Some(cat) if cat.name != UNCATEGORIZED_NAME => {
                cat.name = UNCATEGORIZED_NAME.to_string();
                changed = true;
            }
            Some(_) => {}
            None => {
                let cat = Category::uncategorized();
                self.categories.insert(cat.id.clone(), cat);
                changed = true;
            }
        }

        let orphans: Vec<String> = self
            .bookmarks
            .values()
            .filter(|b| !self.categories.contains_key(&b.category_id))
            .map(|b| b.id.clone())
            .collect();
        for id in orphans {
            if let Some(bookmark) = self.bookmarks.get_mut(&id) {
                debug!(
                    "Re-pointing bookmark {} from missing category {}",
                    id, bookmark.category_id
                );
                bookmark.category_id = UNCATEGORIZED_ID.to_string();
                // Park behind every existing member; renumbering closes the gap
                bookmark.order = i64::MAX;
                changed = true;
            }
        }

        let category_ids: Vec<String> = self.categories.keys().cloned().collect();
        for category_id in category_ids {
            let mut members: Vec<&mut Bookmark> = self
                .bookmarks
                .values_mut()
                .filter(|b| b.category_id == category_id)
                .collect();
            members.sort_by(|a, b| {
                a.order
                    .cmp(&b.order)
                    .then_with(|| b.timestamp.cmp(&a.timestamp))
                    .then_with(|| a.id.cmp(&b.id))
            });
            for (position, bookmark) in members.into_iter().enumerate() {
                let position = position as i64;
                if bookmark.order != position {
                    bookmark.order = position;
                    changed = true;
                }
            }
        }

        changed
    }

    // ==================== Queries ====================

    pub fn sorted_categories(&self) -> Vec<Category> {
        snapshot::sorted_categories(&self.categories)
    }

    pub fn sorted_bookmarks(&self) -> Vec<Bookmark> {
        snapshot::sorted_bookmarks(&self.categories, &self.bookmarks)
    }

    pub fn bookmark_entries(&self) -> Vec<snapshot::BookmarkEntry> {
        snapshot::bookmark_entries(&self.categories, &self.bookmarks)
    }

    pub fn bookmark(&self, id: &str) -> Option<&Bookmark> {
        self.bookmarks.get(id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.get(id)
    }

    pub fn category_by_name(&self, name: &str) -> Option<&Category> {
        self.categories.values().find(|c| c.name == name)
    }

    pub fn bookmark_count(&self) -> usize {
        self.bookmarks.len()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    /// Orders of all bookmarks in a category
    pub fn orders_in(&self, category_id: &str) -> Vec<i64> {
        self.bookmarks
            .values()
            .filter(|b| b.category_id == category_id)
            .map(|b| b.order)
            .collect()
    }

    fn member_count(&self, category_id: &str, exclude_id: &str) -> usize {
        self.bookmarks
            .values()
            .filter(|b| b.category_id == category_id && b.id != exclude_id)
            .count()
    }

    fn next_category_order(&self) -> StoreResult<i64> {
        // Never below 1, so new categories always follow "Uncategorized"
        self.categories
            .values()
            .map(|c| c.order)
            .max()
            .unwrap_or(0)
            .max(0)
            .checked_add(1)
            .ok_or_else(|| {
                StoreError::InvalidInput(
                    "No category order left after the highest one; reorder categories first"
                        .to_string(),
                )
            })
    }

    /// Order slots of every member of a category except `exclude_id`
    fn others_mut<'a>(
        bookmarks: &'a mut HashMap<String, Bookmark>,
        category_id: &'a str,
        exclude_id: &'a str,
    ) -> impl Iterator<Item = &'a mut i64> + 'a {
        bookmarks
            .values_mut()
            .filter(move |b| b.category_id == category_id && b.id != exclude_id)
            .map(|b| &mut b.order)
    }

    // ==================== Category resolution ====================

    /// Insert a new category with the next free order
    fn insert_category(&mut self, name: &str, color: Option<String>) -> StoreResult<Category> {
        let mut category = Category::new(name, self.next_category_order()?);
        category.color = color;
        debug!("Created category {} ({})", category.name, category.id);
        self.categories
            .insert(category.id.clone(), category.clone());
        Ok(category)
    }

    /// Find a category by name, creating it if missing
    fn resolve_or_create(&mut self, name: &str) -> StoreResult<String> {
        match self.category_by_name(name) {
            Some(existing) => Ok(existing.id.clone()),
            None => Ok(self.insert_category(name, None)?.id),
        }
    }

    fn require_category(&self, id: &str) -> StoreResult<()> {
        if self.categories.contains_key(id) {
            Ok(())
        } else {
            Err(StoreError::category_not_found(id))
        }
    }

    fn category_id_by_name(&self, name: &str) -> StoreResult<String> {
        self.category_by_name(name)
            .map(|c| c.id.clone())
            .ok_or_else(|| StoreError::category_not_found(name))
    }

    // ==================== Bookmarks ====================

    /// Create a bookmark, or re-save an existing one with the same URL
    ///
    /// The id is derived from the URL, so saving a URL again updates the
    /// existing bookmark in place (deduplication by URL) instead of adding a
    /// second one. The existing timestamp, notes and visit time are kept.
    pub fn create_bookmark(
        &mut self,
        input: NewBookmark,
        favicon: String,
        now: i64,
    ) -> StoreResult<Bookmark> {
        let url = input.url.trim().to_string();
        if url.is_empty() {
            return Err(StoreError::InvalidInput("url is required".to_string()));
        }

        let explicit_id = input.category_id.filter(|id| !id.is_empty());
        if let Some(id) = &explicit_id {
            self.require_category(id)?;
        }

        let category_id = match (explicit_id, input.category) {
            (Some(id), _) => id,
            (None, Some(name)) if !name.is_empty() && name != UNCATEGORIZED_NAME => {
                self.resolve_or_create(&name)?
            }
            _ => UNCATEGORIZED_ID.to_string(),
        };

        let id = bookmark_id(&url);
        let bookmark = match self.bookmarks.get(&id).cloned() {
            Some(mut existing) => {
                debug!("Re-saving existing bookmark {} ({})", id, url);
                if existing.category_id != category_id {
                    ordering::close_gap(
                        Self::others_mut(&mut self.bookmarks, &existing.category_id, &id),
                        existing.order,
                    );
                    existing.order = ordering::append_position(
                        Self::others_mut(&mut self.bookmarks, &category_id, &id).map(|o| *o),
                    );
                    existing.category_id = category_id;
                }
                existing.url = url;
                existing.title = input.title;
                existing.favicon = favicon;
                existing
            }
            None => {
                debug!("Creating bookmark {} ({})", id, url);
                Bookmark {
                    order: ordering::append_position(self.orders_in(&category_id)),
                    id: id.clone(),
                    url,
                    title: input.title,
                    category_id,
                    timestamp: now,
                    favicon,
                    last_visited: None,
                    notes: String::new(),
                }
            }
        };

        self.bookmarks.insert(id, bookmark.clone());
        Ok(bookmark)
    }

    /// Apply a partial update to a bookmark
    pub fn update_bookmark(&mut self, id: &str, patch: BookmarkPatch) -> StoreResult<Bookmark> {
        let current = self
            .bookmarks
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::bookmark_not_found(id))?;

        let explicit_id = patch.category_id.clone();
        if let Some(category_id) = &explicit_id {
            self.require_category(category_id)?;
        }

        let repositions = patch.repositions();

        let target_category = match (explicit_id, patch.category) {
            (Some(category_id), _) => category_id,
            (None, Some(name)) if !name.is_empty() => self.resolve_or_create(&name)?,
            _ => current.category_id.clone(),
        };

        let mut bookmark = current;
        if let Some(title) = patch.title {
            bookmark.title = title;
        }
        if let Some(notes) = patch.notes {
            bookmark.notes = truncate_notes(&notes);
        }

        if repositions {
            let old_category = bookmark.category_id.clone();
            let old_order = bookmark.order;

            let new_order = if old_category == target_category {
                let others = self.member_count(&old_category, id);
                // Within one category the last valid slot is `others`
                let new_order = ordering::clamp_position(patch.order.unwrap_or(old_order), others);
                ordering::move_within(
                    Self::others_mut(&mut self.bookmarks, &old_category, id),
                    old_order,
                    new_order,
                );
                new_order
            } else {
                let others = self.member_count(&target_category, id);
                let new_order = ordering::clamp_position(
                    patch.order.unwrap_or(others as i64),
                    others,
                );
                ordering::close_gap(
                    Self::others_mut(&mut self.bookmarks, &old_category, id),
                    old_order,
                );
                ordering::open_slot(
                    Self::others_mut(&mut self.bookmarks, &target_category, id),
                    new_order,
                );
                new_order
            };

            debug!(
                "Moved bookmark {} from {}#{} to {}#{}",
                id, old_category, old_order, target_category, new_order
            );
            bookmark.category_id = target_category;
            bookmark.order = new_order;
        }

        self.bookmarks.insert(id.to_string(), bookmark.clone());
        Ok(bookmark)
    }

    /// Remove a bookmark and close the gap in its category
    pub fn delete_bookmark(&mut self, id: &str) -> StoreResult<Bookmark> {
        let removed = self
            .bookmarks
            .remove(id)
            .ok_or_else(|| StoreError::bookmark_not_found(id))?;

        ordering::close_gap(
            Self::others_mut(&mut self.bookmarks, &removed.category_id, id),
            removed.order,
        );
        debug!("Deleted bookmark {} ({})", id, removed.url);
        Ok(removed)
    }

    /// Stamp a bookmark's last visit time
    pub fn record_visit(&mut self, id: &str, now: i64) -> StoreResult<Bookmark> {
        let bookmark = self
            .bookmarks
            .get_mut(id)
            .ok_or_else(|| StoreError::bookmark_not_found(id))?;
        bookmark.last_visited = Some(now);
        Ok(bookmark.clone())
    }

    // ==================== Categories ====================

    /// Create a named category after all existing ones
    pub fn create_category(&mut self, name: &str, color: Option<String>) -> StoreResult<Category> {
        if name.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "Category name is required".to_string(),
            ));
        }
        if self.category_by_name(name).is_some() {
            return Err(StoreError::Conflict(format!(
                "Category '{}' already exists",
                name
            )));
        }
        self.insert_category(name, color.filter(|c| !c.is_empty()))
    }

    /// Rename, reorder or recolor the category called `old_name`
    pub fn update_category(&mut self, old_name: &str, patch: CategoryPatch) -> StoreResult<Category> {
        let category_id = self.category_id_by_name(old_name)?;

        let rename = patch.name.filter(|name| name != old_name);
        if let Some(new_name) = &rename {
            if category_id == UNCATEGORIZED_ID {
                return Err(StoreError::Forbidden(format!(
                    "Cannot rename {} category",
                    UNCATEGORIZED_NAME
                )));
            }
            if new_name.trim().is_empty() {
                return Err(StoreError::InvalidInput(
                    "Category name cannot be empty".to_string(),
                ));
            }
            if self.category_by_name(new_name).is_some() {
                return Err(StoreError::Conflict(format!(
                    "Category '{}' already exists",
                    new_name
                )));
            }
        }
        if let Some(order) = patch.order {
            // The next created category takes `max + 1`
            if order == i64::MAX {
                return Err(StoreError::InvalidInput(format!(
                    "Category order {} is out of range",
                    order
                )));
            }
        }

        let category = self
            .categories
            .get_mut(&category_id)
            .ok_or_else(|| StoreError::category_not_found(old_name))?;
        if let Some(new_name) = rename {
            category.name = new_name;
        }
        if let Some(order) = patch.order {
            category.order = order;
        }
        if let Some(color) = patch.color {
            category.color = if color.is_empty() { None } else { Some(color) };
        }
        debug!("Updated category {} ({})", category.name, category.id);
        Ok(category.clone())
    }

    /// Delete a category, moving its bookmarks to the end of "Uncategorized"
    pub fn delete_category(&mut self, name: &str) -> StoreResult<Category> {
        let category_id = self.category_id_by_name(name)?;
        if category_id == UNCATEGORIZED_ID {
            return Err(StoreError::Forbidden(format!(
                "Cannot delete {} category",
                UNCATEGORIZED_NAME
            )));
        }

        let mut next = ordering::append_position(self.orders_in(UNCATEGORIZED_ID));
        let mut members: Vec<&mut Bookmark> = self
            .bookmarks
            .values_mut()
            .filter(|b| b.category_id == category_id)
            .collect();
        members.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        let moved = members.len();
        for bookmark in members {
            bookmark.category_id = UNCATEGORIZED_ID.to_string();
            bookmark.order = next;
            next += 1;
        }

        let removed = self
            .categories
            .remove(&category_id)
            .ok_or_else(|| StoreError::category_not_found(name))?;
        debug!(
            "Deleted category {} ({}), reassigned {} bookmarks",
            removed.name, removed.id, moved
        );
        Ok(removed)
    }

    /// Set each listed category's order to its index in `ids`
    ///
    /// Unknown ids are skipped and unlisted categories keep their order.
    pub fn reorder_categories(&mut self, ids: &[String]) -> StoreResult<()> {
        if ids.is_empty() {
            return Err(StoreError::InvalidInput(
                "Order array is required".to_string(),
            ));
        }
        for (index, id) in ids.iter().enumerate() {
            if let Some(category) = self.categories.get_mut(id) {
                category.order = index as i64;
            }
        }
        debug!("Reordered {} categories", ids.len());
        Ok(())
    }
}
