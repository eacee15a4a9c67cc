//! bookmarkd
//!
//! Self-hosted bookmark manager: HTTP JSON API server plus command-line
//! access to the same bookmarks file.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bookmarkd_core::{BookmarkPatch, CategoryPatch, Config, StorageError, Store};

mod commands;
mod editor;
mod output;
mod server;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "bookmarkd")]
#[command(about = "bookmarkd - Self-hosted bookmark manager")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server (default)
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Manage bookmarks
    Bookmark {
        #[command(subcommand)]
        command: BookmarkCommands,
    },
    /// Manage categories
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show status (storage file, counts)
    Status,
}

#[derive(Subcommand)]
enum BookmarkCommands {
    /// Save a bookmark
    #[command(alias = "create")]
    Add {
        /// URL to save
        url: String,
        /// Title (defaults to the URL)
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// Category name (created if missing)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List bookmarks in display order
    #[command(alias = "ls")]
    List {
        /// Only show this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show bookmark details (including notes)
    Show {
        /// Bookmark ID (full or prefix)
        id: String,
    },
    /// Edit a bookmark
    Edit {
        /// Bookmark ID (full or prefix)
        id: String,
        #[arg(short = 'T', long)]
        title: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
        /// Open $EDITOR for the notes
        #[arg(long, conflicts_with = "notes")]
        edit_notes: bool,
        /// Move to this category (created if missing)
        #[arg(short, long)]
        category: Option<String>,
        /// Position within the category, starting at 0
        #[arg(short, long)]
        order: Option<i64>,
    },
    /// Delete a bookmark
    #[command(alias = "rm")]
    Delete {
        /// Bookmark ID (full or prefix)
        id: String,
    },
    /// Record a visit
    Visit {
        /// Bookmark ID (full or prefix)
        id: String,
    },
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// List categories in display order
    #[command(alias = "ls")]
    List,
    /// Create a category
    #[command(alias = "create")]
    Add {
        name: String,
        #[arg(long)]
        color: Option<String>,
    },
    /// Rename, reorder or recolor a category
    Edit {
        /// Current name
        name: String,
        /// New name
        #[arg(long = "name")]
        new_name: Option<String>,
        #[arg(short, long)]
        order: Option<i64>,
        /// Color (empty string clears it)
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a category; its bookmarks move to Uncategorized
    #[command(alias = "rm")]
    Delete { name: String },
    /// Set the category order, listing names first to last
    Reorder {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, host, port, favicon_service, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            if let Some(hint) = recovery_hint(&err) {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

/// Suggestion for a storage failure anywhere in the error chain
fn recovery_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<StorageError>())
        .find_map(StorageError::recovery_suggestion)
}

async fn run(cli: Cli) -> Result<()> {
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Commands that don't need the store
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    let serving = matches!(&cli.command, Some(Commands::Serve { .. }) | None);
    init_logging(&config, serving);

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            run_server(config).await
        }
        None => run_server(config).await,
        Some(Commands::Bookmark { command }) => {
            let store = Store::open_with_config(config)?;
            handle_bookmark_command(command, &store, &output)
        }
        Some(Commands::Category { command }) => {
            let store = Store::open_with_config(config)?;
            handle_category_command(command, &store, &output)
        }
        Some(Commands::Status) => {
            let store = Store::open_with_config(config)?;
            commands::status::show(&store, &output)
        }
        Some(Commands::Config { .. }) => Ok(()), // Handled above
    }
}

async fn run_server(config: Config) -> Result<()> {
    let addr = config.bind_addr();
    let store = Store::open_with_config(config).context("Failed to open bookmark store")?;
    let stats = store.stats();
    info!(
        "Serving {} bookmarks in {} categories from {:?}",
        stats.bookmarks,
        stats.categories,
        store.path()
    );
    server::serve(Arc::new(store), &addr).await
}

fn handle_bookmark_command(command: BookmarkCommands, store: &Store, output: &Output) -> Result<()> {
    match command {
        BookmarkCommands::Add {
            url,
            title,
            category,
        } => commands::bookmark::add(store, url, title, category, output),
        BookmarkCommands::List { category } => commands::bookmark::list(store, category, output),
        BookmarkCommands::Show { id } => commands::bookmark::show(store, id, output),
        BookmarkCommands::Edit {
            id,
            title,
            notes,
            edit_notes,
            category,
            order,
        } => {
            let patch = BookmarkPatch {
                title,
                notes,
                category,
                order,
                ..Default::default()
            };
            commands::bookmark::edit(store, id, patch, edit_notes, output)
        }
        BookmarkCommands::Delete { id } => commands::bookmark::delete(store, id, output),
        BookmarkCommands::Visit { id } => commands::bookmark::visit(store, id, output),
    }
}

fn handle_category_command(command: CategoryCommands, store: &Store, output: &Output) -> Result<()> {
    match command {
        CategoryCommands::List => commands::category::list(store, output),
        CategoryCommands::Add { name, color } => {
            commands::category::add(store, name, color, output)
        }
        CategoryCommands::Edit {
            name,
            new_name,
            order,
            color,
        } => {
            let patch = CategoryPatch {
                name: new_name,
                order,
                color,
            };
            commands::category::edit(store, name, patch, output)
        }
        CategoryCommands::Delete { name } => commands::category::delete(store, name, output),
        CategoryCommands::Reorder { names } => commands::category::reorder(store, names, output),
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Initialize tracing
///
/// `RUST_LOG` wins when set. Otherwise the server logs at info and the
/// one-shot commands only at warn, so they don't clutter their output.
/// Logs go to `log_file` when configured, stderr otherwise.
fn init_logging(config: &Config, serving: bool) {
    let default_level = if serving { "info" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "bookmarkd_core={},bookmarkd={}",
            default_level, default_level
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    // Ignore error if already initialized
    match &config.log_file {
        Some(log_path) => match OpenOptions::new().create(true).append(true).open(log_path) {
            Ok(file) => {
                let _ = builder
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .try_init();
            }
            Err(e) => {
                eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
                let _ = builder.with_writer(std::io::stderr).try_init();
            }
        },
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookmarkd_core::StoreError;

    #[test]
    fn test_recovery_hint_found_through_context() {
        let storage = StorageError::CreateDirectory {
            path: PathBuf::from("/data"),
            source: std::io::Error::new(std::io::ErrorKind::AlreadyExists, "file exists"),
        };
        let err = anyhow::Error::new(StoreError::Persistence(storage))
            .context("Failed to save bookmark");

        let hint = recovery_hint(&err).unwrap();
        assert!(hint.contains("data_dir"));
    }

    #[test]
    fn test_recovery_hint_absent_for_other_errors() {
        let err = anyhow::Error::new(StoreError::InvalidInput("url is required".to_string()));
        assert!(recovery_hint(&err).is_none());

        let err = anyhow::anyhow!("Bookmark 'abc' not found");
        assert!(recovery_hint(&err).is_none());
    }
}
