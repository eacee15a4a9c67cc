//! Category command handlers

use anyhow::{bail, Context, Result};

use bookmarkd_core::{Category, CategoryPatch, Store};

use crate::editor::confirm;
use crate::output::Output;

/// List categories with bookmark counts
pub fn list(store: &Store, output: &Output) -> Result<()> {
    let bookmarks = store.get_bookmarks();
    let categories: Vec<(Category, usize)> = store
        .get_categories()
        .into_iter()
        .map(|category| {
            let count = bookmarks
                .iter()
                .filter(|b| b.category_id == category.id)
                .count();
            (category, count)
        })
        .collect();

    output.print_categories(&categories);
    Ok(())
}

/// Create a category
pub fn add(store: &Store, name: String, color: Option<String>, output: &Output) -> Result<()> {
    let category = store
        .create_category(&name, color)
        .context("Failed to create category")?;

    output.success(&format!("Created category: {}", category.name));
    output.print_category(&category);
    Ok(())
}

/// Rename, reorder or recolor a category
pub fn edit(store: &Store, name: String, patch: CategoryPatch, output: &Output) -> Result<()> {
    if patch.name.is_none() && patch.order.is_none() && patch.color.is_none() {
        bail!("Nothing to change. Pass --name, --order or --color.");
    }

    let category = store
        .update_category(&name, patch)
        .context("Failed to update category")?;

    output.success("Category updated");
    output.print_category(&category);
    Ok(())
}

/// Delete a category; its bookmarks move to "Uncategorized"
pub fn delete(store: &Store, name: String, output: &Output) -> Result<()> {
    if output.should_prompt() {
        println!("Delete category: {} (bookmarks move to Uncategorized)", name);
        if !confirm("Are you sure?")? {
            output.message("Cancelled.");
            return Ok(());
        }
    }

    let removed = store
        .delete_category(&name)
        .context("Failed to delete category")?;

    output.success(&format!("Deleted category: {}", removed.name));
    Ok(())
}

/// Put categories in the given order, by name
pub fn reorder(store: &Store, names: Vec<String>, output: &Output) -> Result<()> {
    let ids = ids_for_names(&store.get_categories(), &names)?;

    store
        .reorder_categories(&ids)
        .context("Failed to reorder categories")?;

    output.success(&format!("Reordered {} categories", ids.len()));
    Ok(())
}

fn ids_for_names(categories: &[Category], names: &[String]) -> Result<Vec<String>> {
    names
        .iter()
        .map(|name| match categories.iter().find(|c| &c.name == name) {
            Some(category) => Ok(category.id.clone()),
            None => bail!("No category named: {}", name),
        })
        .collect()
}
