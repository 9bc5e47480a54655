//! SQLite storage bootstrap, schema migrations and transaction sessions.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the product store.
//! - Apply schema migrations in deterministic order.
//! - Track the single live transaction of a unit of work (`Session`).
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No product data is read or written before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
pub(crate) mod session;

pub use open::{open_connection, open_db, open_db_in_memory};
pub use session::TransactionHandle;

pub type DbResult<T> = Result<T, DbError>;

/// Failure to produce or keep a usable session connection.
#[derive(Debug)]
pub enum DbError {
    /// The database file or in-memory database could not be opened.
    Open(rusqlite::Error),
    /// A connection setting (pragma, busy timeout) could not be applied.
    Bootstrap {
        step: &'static str,
        source: rusqlite::Error,
    },
    /// Migration `version` failed; the schema was left at its prior version.
    Migration { version: u32, source: rusqlite::Error },
    /// The database was written by a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A transaction could not be begun on an open connection.
    Begin(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open(err) => write!(f, "cannot open database: {err}"),
            Self::Bootstrap { step, source } => {
                write!(f, "connection setup failed at {step}: {source}")
            }
            Self::Migration { version, source } => {
                write!(f, "schema migration {version} failed: {source}")
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Begin(err) => write!(f, "cannot begin transaction: {err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open(err) | Self::Begin(err) => Some(err),
            Self::Bootstrap { source, .. } | Self::Migration { source, .. } => Some(source),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl DbError {
    pub(crate) fn bootstrap(step: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Self::Bootstrap { step, source }
    }

    pub(crate) fn migration(version: u32) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Self::Migration { version, source }
    }
}
