//! YuDB CLI
//!
//! Command-line shell for YuDB document stores.
//!
//! # Commands
//!
//! - `ls`, `create`, `remove` - Manage databases and collections
//! - `add`, `read`, `delete`, `update` - Work with documents
//! - `backup`, `restore`, `verify-backup` - Back up and restore the store
//! - `change-username`, `change-password` - Manage credentials

mod commands;

use clap::{Parser, Subcommand};
use commands::query::Selector;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use yudb_core::{Shell, ShellConfig};

/// YuDB command-line shell.
#[derive(Parser)]
#[command(name = "yudb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the data directory
    #[arg(global = true, short, long, default_value = "./yudb-data")]
    path: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List databases, or the collections of a database
    Ls {
        /// Database to list collections of
        database: Option<String>,
    },

    /// Create a database, or a collection in a database
    Create {
        /// Database name
        database: Option<String>,

        /// Collection name
        collection: Option<String>,

        /// Inline JSON schema for a new collection
        #[arg(long, conflicts_with = "schema_name")]
        schema: Option<String>,

        /// Name of a schema file in the schema directory
        #[arg(long)]
        schema_name: Option<String>,
    },

    /// Remove a database, or a collection of a database
    Remove {
        /// Database name
        database: Option<String>,

        /// Collection name
        collection: Option<String>,
    },

    /// Add JSON documents to a collection
    Add {
        /// Database name
        database: String,

        /// Collection name
        collection: String,

        /// Documents, one JSON value per argument
        #[arg(required = true)]
        documents: Vec<String>,
    },

    /// Read documents from a collection
    Read {
        /// Database name
        database: String,

        /// Collection name
        collection: String,

        #[command(flatten)]
        selector: Selector,
    },

    /// Delete documents from a collection
    Delete {
        /// Database name
        database: String,

        /// Collection name
        collection: String,

        #[command(flatten)]
        selector: Selector,
    },

    /// Update documents in a collection
    Update {
        /// Database name
        database: String,

        /// Collection name
        collection: String,

        #[command(flatten)]
        selector: Selector,

        /// JSON object merged into every matching document
        #[arg(long)]
        set: String,
    },

    /// Back up every database
    Backup,

    /// Restore the last backup
    Restore,

    /// Check the backup file without restoring it
    VerifyBackup,

    /// Change the username
    ChangeUsername,

    /// Change the password
    ChangePassword,

    /// Clear the screen
    Clear,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = ShellConfig::new(&cli.path);

    // Commands that must not take the data directory lock
    match cli.command {
        Commands::Version => {
            println!("YuDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("YuDB Core v{}", yudb_core::VERSION);
            return Ok(());
        }
        Commands::VerifyBackup => return commands::admin::verify_backup(&config.backup_path),
        _ => {}
    }

    let mut shell = Shell::open(&config)?;

    match cli.command {
        Commands::Ls { database } => commands::namespace::ls(&shell, database.as_deref())?,
        Commands::Create {
            database,
            collection,
            schema,
            schema_name,
        } => commands::namespace::create(
            &mut shell,
            database.as_deref(),
            collection.as_deref(),
            schema.as_deref(),
            schema_name,
        )?,
        Commands::Remove {
            database,
            collection,
        } => commands::namespace::remove(&mut shell, database.as_deref(), collection.as_deref())?,
        Commands::Add {
            database,
            collection,
            documents,
        } => commands::documents::add(&shell, &database, &collection, &documents)?,
        Commands::Read {
            database,
            collection,
            selector,
        } => commands::documents::read(&shell, &database, &collection, &selector)?,
        Commands::Delete {
            database,
            collection,
            selector,
        } => commands::documents::delete(&shell, &database, &collection, &selector)?,
        Commands::Update {
            database,
            collection,
            selector,
            set,
        } => commands::documents::update(&shell, &database, &collection, &selector, &set)?,
        Commands::Backup => commands::admin::backup(&shell)?,
        Commands::Restore => commands::admin::restore(&mut shell)?,
        Commands::ChangeUsername => commands::admin::change_username(&shell)?,
        Commands::ChangePassword => commands::admin::change_password(&shell)?,
        Commands::Clear => shell.clear()?,
        Commands::Version | Commands::VerifyBackup => {}
    }

    Ok(())
}
