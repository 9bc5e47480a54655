//! Store configuration consumed by unit-of-work construction.
//!
//! # Responsibility
//! - Describe where the database lives and how connections are tuned.
//! - Select the commit failure policy (`CommitMode`).
//!
//! # Invariants
//! - Defaults match the historical behavior: 5s busy timeout, lenient commit.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Location of the backing SQLite database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    /// Database file on disk. Created on first open.
    File(PathBuf),
    /// Private in-memory database, discarded when the connection closes.
    Memory,
}

impl DatabaseTarget {
    /// Parses a user-supplied database location.
    ///
    /// `:memory:` and `memory` (case-insensitive) select an in-memory database,
    /// anything else is treated as a file path.
    pub fn parse(value: &str) -> Result<Self, String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("database location cannot be empty".to_string());
        }
        if trimmed == ":memory:" || trimmed.eq_ignore_ascii_case("memory") {
            return Ok(Self::Memory);
        }
        Ok(Self::File(PathBuf::from(trimmed)))
    }

    pub(crate) fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

/// How `commit` reports a transaction the store refused to commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitMode {
    /// Roll back, reset, and report `CommitOutcome::RolledBack` as success.
    #[default]
    Lenient,
    /// Roll back, reset, and return `DataAccessError::CommitFailed`.
    Strict,
}

impl FromStr for CommitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "unsupported commit mode `{other}`; expected lenient|strict"
            )),
        }
    }
}

/// Connection settings shared by every unit of work a factory creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database: DatabaseTarget,
    pub busy_timeout: Duration,
    pub commit_mode: CommitMode,
}

impl StoreConfig {
    pub fn new(database: DatabaseTarget) -> Self {
        Self {
            database,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            commit_mode: CommitMode::default(),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(DatabaseTarget::File(path.into()))
    }

    pub fn in_memory() -> Self {
        Self::new(DatabaseTarget::Memory)
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn with_commit_mode(mut self, commit_mode: CommitMode) -> Self {
        self.commit_mode = commit_mode;
        self
    }
}
