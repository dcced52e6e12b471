use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// Keyword selecting a volatile, process-local database.
pub const MEMORY_KEYWORD: &str = ":memory:";

/// Where the balance store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// A SQLite file, created on first use if missing.
    File(PathBuf),
    /// An in-memory database that lives as long as its repository.
    Memory,
}

impl StoreLocation {
    /// Interpret a connection target: `:memory:` selects the volatile
    /// store, anything else is a file path.
    pub fn parse(target: &str) -> Self {
        let target = target.trim();
        if target == MEMORY_KEYWORD {
            StoreLocation::Memory
        } else {
            StoreLocation::File(PathBuf::from(target))
        }
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, StoreLocation::Memory)
    }

    pub(crate) fn connect_options(&self) -> Result<SqliteConnectOptions, sqlx::Error> {
        match self {
            StoreLocation::File(path) => Ok(SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)),
            StoreLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:"),
        }
    }

    pub(crate) fn pool_options(&self) -> SqlitePoolOptions {
        match self {
            StoreLocation::File(_) => SqlitePoolOptions::new(),
            // Every in-memory connection is its own database, so keep exactly
            // one and never let the pool recycle it.
            StoreLocation::Memory => SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
        }
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreLocation::File(path) => write!(f, "{}", path.display()),
            StoreLocation::Memory => write!(f, "{}", MEMORY_KEYWORD),
        }
    }
}
