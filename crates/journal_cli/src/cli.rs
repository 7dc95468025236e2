//! Command-line surface and configuration.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "journal",
    about = "Journal entries over a SQLite file with optimistic concurrency",
    version
)]
pub struct Cli {
    /// SQLite database file
    #[arg(long, env = "JOURNAL_DB", default_value = "journal.sqlite3")]
    pub db: PathBuf,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, env = "JOURNAL_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "JOURNAL_LOG_DIR")]
    pub log_dir: Option<String>,

    /// Milliseconds to wait for another writer's lock
    #[arg(long, env = "JOURNAL_BUSY_TIMEOUT_MS", default_value_t = 5_000)]
    pub busy_timeout_ms: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print all entries, oldest first
    List,

    /// Print one entry
    Get {
        /// Entry id
        id: String,
    },

    /// Create an entry
    Create {
        /// Entry text
        content: String,
    },

    /// Replace an entry's text
    Update {
        /// Entry id
        id: String,

        /// New entry text
        content: String,

        /// Total attempts when another writer commits first
        #[arg(long, default_value_t = 1)]
        retry: u32,
    },

    /// Delete an entry
    Delete {
        /// Entry id
        id: String,
    },
}
