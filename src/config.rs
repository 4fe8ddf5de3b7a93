//! Database configuration and path resolution

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default backing file name when the caller supplies nothing
pub const DEFAULT_DB_FILE: &str = "database.db";

/// Connection settings for the backing SQLite file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path of the database file; created on first open if missing
    pub path: PathBuf,
    /// SQLite busy timeout in milliseconds
    pub busy_timeout_ms: u64,
    /// Enable write-ahead logging
    pub wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_FILE),
            busy_timeout_ms: 5000,
            wal: true,
        }
    }
}

impl DatabaseConfig {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// Resolve the database path by priority:
/// 1. Explicit argument (highest)
/// 2. Environment variable
/// 3. Compiled default (`database.db`)
pub fn resolve_database_path(explicit: Option<&str>, env_var_name: &str) -> PathBuf {
    if let Some(path) = explicit {
        return PathBuf::from(path);
    }
    if let Ok(path) = std::env::var(env_var_name) {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_DB_FILE)
}
