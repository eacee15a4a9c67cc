//! Status command handler

use anyhow::Result;

use bookmarkd_core::Store;

use crate::output::{Output, OutputFormat};

/// Show status information
pub fn show(store: &Store, output: &Output) -> Result<()> {
    let stats = store.stats();
    let config = store.config();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "listen": config.bind_addr(),
                    "storage": {
                        "path": store.path(),
                        "file_exists": stats.storage.file_exists,
                        "file_size": stats.storage.file_size
                    },
                    "counts": {
                        "bookmarks": stats.bookmarks,
                        "categories": stats.categories
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", stats.bookmarks);
        }
        OutputFormat::Human => {
            println!("bookmarkd Status");
            println!("================");
            println!();
            println!("Server:");
            println!("  Listen: http://{}", config.bind_addr());
            println!();
            println!("Storage:");
            println!("  File: {}", store.path().display());
            if stats.storage.file_exists {
                println!("  Size: {}", stats.storage.file_size_human());
            } else {
                println!("  Size: (not written yet)");
            }
            println!();
            println!("Contents:");
            println!("  Bookmarks:  {}", stats.bookmarks);
            println!("  Categories: {}", stats.categories);
        }
    }

    Ok(())
}
