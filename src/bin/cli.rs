//! JsonKV CLI
//!
//! Command-line interface for inspecting and editing a JsonKV store file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use jsonkv::{Config, Store};
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

/// JsonKV CLI
#[derive(Parser, Debug)]
#[command(name = "jsonkv")]
#[command(about = "CLI for the JsonKV single-file key-value store")]
#[command(version)]
struct Args {
    /// Backing JSON file
    #[arg(short, long, default_value = "./database.json")]
    file: PathBuf,

    /// Passphrase for an encrypted store
    #[arg(short = 'k', long, env = "JSONKV_ENCRYPTION_KEY")]
    encryption_key: Option<String>,

    /// Do not append to the transaction log
    #[arg(long)]
    no_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set (parsed as JSON, otherwise stored as a string)
        value: String,
    },

    /// Remove a key
    Remove {
        /// The key to remove
        key: String,
    },

    /// Print every entry
    List,

    /// Print entries whose string value contains a substring
    Search {
        /// Substring to look for
        query: String,
    },

    /// Print one page of entries
    Page {
        /// Page number (1-indexed)
        page: usize,

        /// Entries per page
        #[arg(short, long, default_value = "10")]
        size: usize,
    },

    /// Write the store as plaintext JSON to another file
    Export {
        /// Destination file
        path: PathBuf,
    },

    /// Write a backup next to the store file
    Backup,

    /// Remove every entry
    Clear,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,jsonkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut builder = Config::builder()
        .path(&args.file)
        .transaction_log(!args.no_log)
        .cache_size(0);
    if let Some(key) = &args.encryption_key {
        builder = builder.encryption_key(key);
    }

    let store = match Store::open(builder.build()) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&store, args.command) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Command failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Execute one command; a `get` miss exits with status 2
fn run(store: &Store, command: Commands) -> jsonkv::Result<ExitCode> {
    match command {
        Commands::Get { key } => match store.get(&key) {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => {
                eprintln!("(nil)");
                return Ok(ExitCode::from(2));
            }
        },
        Commands::Set { key, value } => {
            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            store.set(key, value)?;
            println!("OK");
        }
        Commands::Remove { key } => {
            store.remove(&key)?;
            println!("OK");
        }
        Commands::List => println!("{}", serde_json::to_string_pretty(&store.get_all())?),
        Commands::Search { query } => {
            println!("{}", serde_json::to_string_pretty(&store.search(&query))?)
        }
        Commands::Page { page, size } => {
            println!("{}", serde_json::to_string_pretty(&store.get_page(page, size))?)
        }
        Commands::Export { path } => {
            store.export_to(&path)?;
            println!("Exported {} entries to {}", store.size(), path.display());
        }
        Commands::Backup => {
            let path = store.backup()?;
            println!("Backup written to {}", path.display());
        }
        Commands::Clear => {
            store.clear()?;
            println!("OK");
        }
    }
    Ok(ExitCode::SUCCESS)
}
