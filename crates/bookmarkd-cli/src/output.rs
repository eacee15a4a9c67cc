//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use chrono::DateTime;
use serde::Serialize;

use bookmarkd_core::{Bookmark, BookmarkEntry, Category};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a single bookmark
    pub fn print_bookmark(&self, bookmark: &Bookmark, category: &str) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", bookmark.id);
                println!("Title:    {}", bookmark.title);
                println!("URL:      {}", bookmark.url);
                println!("Category: {} (#{})", category, bookmark.order);
                println!("Saved:    {}", format_timestamp(bookmark.timestamp));
                if let Some(visited) = bookmark.last_visited {
                    println!("Visited:  {}", format_timestamp(visited));
                }
                if !bookmark.notes.is_empty() {
                    println!();
                    println!("── Notes ──");
                    println!("{}", bookmark.notes);
                }
            }
            OutputFormat::Json => print_json(bookmark),
            OutputFormat::Quiet => {
                println!("{}", bookmark.id);
            }
        }
    }

    /// Print bookmarks grouped under their category headings
    pub fn print_bookmarks(&self, entries: &[BookmarkEntry]) {
        match self.format {
            OutputFormat::Human => {
                if entries.is_empty() {
                    println!("No bookmarks found.");
                    return;
                }
                let mut current: Option<&str> = None;
                for entry in entries {
                    if current != Some(entry.bookmark.category_id.as_str()) {
                        if current.is_some() {
                            println!();
                        }
                        println!("── {} ──", entry.category);
                        current = Some(entry.bookmark.category_id.as_str());
                    }
                    let notes_indicator = if entry.bookmark.notes.is_empty() {
                        ""
                    } else {
                        " *"
                    };
                    println!(
                        "{} | {}{} | {}",
                        short_id(&entry.bookmark.id),
                        truncate(&entry.bookmark.title, 35),
                        notes_indicator,
                        truncate(&entry.bookmark.url, 45)
                    );
                }
                println!("\n{} bookmark(s)", entries.len());
            }
            OutputFormat::Json => print_json(&entries),
            OutputFormat::Quiet => {
                for entry in entries {
                    println!("{}", entry.bookmark.id);
                }
            }
        }
    }

    /// Print a single category
    pub fn print_category(&self, category: &Category) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:    {}", category.id);
                println!("Name:  {}", category.name);
                println!("Order: {}", category.order);
                if let Some(ref color) = category.color {
                    println!("Color: {}", color);
                }
            }
            OutputFormat::Json => print_json(category),
            OutputFormat::Quiet => {
                println!("{}", category.id);
            }
        }
    }

    /// Print categories with their bookmark counts
    pub fn print_categories(&self, categories: &[(Category, usize)]) {
        match self.format {
            OutputFormat::Human => {
                for (category, count) in categories {
                    let color = category
                        .color
                        .as_deref()
                        .map(|c| format!(" [{}]", c))
                        .unwrap_or_default();
                    println!(
                        "{:>3}. {}{} ({}) | {}",
                        category.order,
                        category.name,
                        color,
                        count,
                        category.id
                    );
                }
                println!("\n{} categor{}", categories.len(), plural_y(categories.len()));
            }
            OutputFormat::Json => {
                let json_categories: Vec<_> = categories
                    .iter()
                    .map(|(category, count)| {
                        serde_json::json!({
                            "id": category.id,
                            "name": category.name,
                            "order": category.order,
                            "color": category.color,
                            "count": count
                        })
                    })
                    .collect();
                print_json(&json_categories);
            }
            OutputFormat::Quiet => {
                for (category, _) in categories {
                    println!("{}", category.name);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

fn plural_y(count: usize) -> &'static str {
    if count == 1 {
        "y"
    } else {
        "ies"
    }
}

/// First 8 characters of an id
fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Format a unix timestamp for display
fn format_timestamp(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
