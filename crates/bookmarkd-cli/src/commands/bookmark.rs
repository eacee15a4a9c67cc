//! Bookmark command handlers

use anyhow::{bail, Context, Result};

use bookmarkd_core::{Bookmark, BookmarkPatch, NewBookmark, Store, UNCATEGORIZED_NAME};

use crate::editor::{confirm, edit_notes, prompt_with_default};
use crate::output::Output;

/// Save a bookmark (re-saving an existing URL updates it)
pub fn add(
    store: &Store,
    url: String,
    title: Option<String>,
    category: Option<String>,
    output: &Output,
) -> Result<()> {
    let title = title.unwrap_or_else(|| url.clone());
    let mut input = NewBookmark::new(url, title);
    input.category = category;

    let bookmark = store
        .create_bookmark(input)
        .context("Failed to save bookmark")?;

    output.success(&format!("Saved bookmark: {}", bookmark.id));
    output.print_bookmark(&bookmark, &category_name(store, &bookmark));
    Ok(())
}

/// List bookmarks, optionally only those in one category
pub fn list(store: &Store, category: Option<String>, output: &Output) -> Result<()> {
    let mut entries = store.list_bookmarks();
    if let Some(name) = category {
        entries.retain(|entry| entry.category == name);
    }
    output.print_bookmarks(&entries);
    Ok(())
}

/// Show a single bookmark
pub fn show(store: &Store, id: String, output: &Output) -> Result<()> {
    let bookmark = resolve(store, &id)?;
    output.print_bookmark(&bookmark, &category_name(store, &bookmark));
    Ok(())
}

/// Edit a bookmark
///
/// With no field flags in human mode, prompts for title and category.
pub fn edit(
    store: &Store,
    id: String,
    mut patch: BookmarkPatch,
    open_editor: bool,
    output: &Output,
) -> Result<()> {
    let bookmark = resolve(store, &id)?;

    let nothing_given = patch.title.is_none()
        && patch.notes.is_none()
        && patch.category.is_none()
        && patch.category_id.is_none()
        && patch.order.is_none();

    if open_editor {
        match edit_notes(&bookmark)? {
            Some(notes) => patch.notes = Some(notes),
            None if nothing_given => {
                output.message("Notes unchanged.");
                return Ok(());
            }
            None => {}
        }
    } else if nothing_given {
        if !output.should_prompt() {
            bail!("Nothing to change. Pass --title, --notes, --category or --order.");
        }

        println!("Editing bookmark: {}", bookmark.id);
        println!("Press Enter to keep current value, or type new value.\n");

        patch.title = prompt_with_default("Title", &bookmark.title)?;
        patch.category = prompt_with_default("Category", &category_name(store, &bookmark))?;
    }

    let updated = store
        .update_bookmark(&bookmark.id, patch)
        .context("Failed to update bookmark")?;

    output.success("Bookmark updated");
    output.print_bookmark(&updated, &category_name(store, &updated));
    Ok(())
}

/// Delete a bookmark
pub fn delete(store: &Store, id: String, output: &Output) -> Result<()> {
    let bookmark = resolve(store, &id)?;

    if output.should_prompt() {
        println!("Delete bookmark: {} - {}", short(&bookmark.id), bookmark.title);
        if !confirm("Are you sure?")? {
            output.message("Cancelled.");
            return Ok(());
        }
    }

    store
        .delete_bookmark(&bookmark.id)
        .context("Failed to delete bookmark")?;

    output.success(&format!("Deleted bookmark: {}", bookmark.id));
    Ok(())
}

/// Record a visit to a bookmark
pub fn visit(store: &Store, id: String, output: &Output) -> Result<()> {
    let bookmark = resolve(store, &id)?;
    store
        .record_visit(&bookmark.id)
        .context("Failed to record visit")?;
    output.success(&format!("Visited: {}", bookmark.url));
    Ok(())
}

/// Find a bookmark by full id or unique id prefix
fn resolve(store: &Store, id: &str) -> Result<Bookmark> {
    if let Some(bookmark) = store.get_bookmark(id) {
        return Ok(bookmark);
    }

    let mut matches: Vec<Bookmark> = store
        .get_bookmarks()
        .into_iter()
        .filter(|b| b.id.starts_with(id))
        .collect();

    match matches.len() {
        0 => bail!("No bookmark found matching: {}", id),
        1 => Ok(matches.remove(0)),
        _ => {
            eprintln!("Multiple bookmarks match '{}':", id);
            for bookmark in &matches {
                eprintln!("  {} - {}", bookmark.id, bookmark.title);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

fn category_name(store: &Store, bookmark: &Bookmark) -> String {
    store
        .get_categories()
        .into_iter()
        .find(|c| c.id == bookmark.category_id)
        .map(|c| c.name)
        .unwrap_or_else(|| UNCATEGORIZED_NAME.to_string())
}

fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookmarkd_core::Config;
    use tempfile::TempDir;

    fn test_store(temp_dir: &TempDir) -> Store {
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };
        Store::open_with_config(config).unwrap()
    }

    #[test]
    fn test_resolve_by_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let bookmark = store
            .create_bookmark(NewBookmark::new("https://a.com", "A"))
            .unwrap();

        assert_eq!(resolve(&store, &bookmark.id).unwrap().id, bookmark.id);
        assert_eq!(resolve(&store, &bookmark.id[..8]).unwrap().id, bookmark.id);
        assert!(resolve(&store, "zzzz").is_err());
    }

    #[test]
    fn test_category_name_lookup() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let bookmark = store
            .create_bookmark(NewBookmark::new("https://a.com", "A").in_category("Work"))
            .unwrap();

        assert_eq!(category_name(&store, &bookmark), "Work");
    }
}
