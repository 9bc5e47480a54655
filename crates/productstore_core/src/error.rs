//! Data-access error taxonomy shared by executor, repositories and unit of work.
//!
//! # Invariants
//! - Business absence ("no such product") is never represented here; it is an
//!   `Option`/`bool` result at the repository boundary.
//! - Driver errors are classified once, in `From<rusqlite::Error>`.

use crate::db::DbError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type DataResult<T> = Result<T, DataAccessError>;

/// Row-count violation of a single-row query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardinalityError {
    /// Exactly one (or at least one) row was required, none were returned.
    NoRows,
    /// At most one row was allowed, several were returned.
    MultipleRows,
}

impl Display for CardinalityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRows => write!(f, "query returned no rows"),
            Self::MultipleRows => write!(f, "query returned more than one row"),
        }
    }
}

impl Error for CardinalityError {}

#[derive(Debug)]
pub enum DataAccessError {
    /// The connection could not be opened or a transaction could not be begun.
    Connection(DbError),
    Cardinality(CardinalityError),
    /// The store rejected a mutation (NOT NULL, CHECK, UNIQUE, FOREIGN KEY).
    Constraint(rusqlite::Error),
    /// The unit of work was disposed.
    Disposed,
    /// A repository or executor outlived the transaction it was bound to.
    StaleTransaction,
    /// SQLite rolled the transaction back on its own, e.g. after an
    /// interrupted write. Roll back or commit to start a fresh one.
    TransactionAborted,
    /// A statement ran past its per-statement timeout and was interrupted.
    Timeout,
    InvalidStatement(String),
    /// A multi-result-set reader was read past its last result set.
    ResultSetsExhausted,
    /// Strict commit mode: the commit was refused and rolled back.
    CommitFailed(Box<DataAccessError>),
    /// A column value could not be mapped to the requested Rust type.
    InvalidData(String),
    Sqlite(rusqlite::Error),
}

impl Display for DataAccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection(err) => write!(f, "connection error: {err}"),
            Self::Cardinality(err) => write!(f, "cardinality error: {err}"),
            Self::Constraint(err) => write!(f, "constraint violation: {err}"),
            Self::Disposed => write!(f, "unit of work has been disposed"),
            Self::StaleTransaction => {
                write!(f, "repository used after its transaction ended")
            }
            Self::TransactionAborted => {
                write!(f, "transaction was rolled back by the database")
            }
            Self::Timeout => write!(f, "statement exceeded its timeout"),
            Self::InvalidStatement(message) => write!(f, "invalid statement: {message}"),
            Self::ResultSetsExhausted => write!(f, "no more result sets to read"),
            Self::CommitFailed(cause) => {
                write!(f, "commit failed and was rolled back: {cause}")
            }
            Self::InvalidData(message) => write!(f, "invalid data: {message}"),
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DataAccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connection(err) => Some(err),
            Self::Cardinality(err) => Some(err),
            Self::Constraint(err) | Self::Sqlite(err) => Some(err),
            Self::CommitFailed(cause) => Some(cause.as_ref()),
            Self::Disposed
            | Self::StaleTransaction
            | Self::TransactionAborted
            | Self::Timeout
            | Self::InvalidStatement(_)
            | Self::ResultSetsExhausted
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<CardinalityError> for DataAccessError {
    fn from(value: CardinalityError) -> Self {
        Self::Cardinality(value)
    }
}

impl From<DbError> for DataAccessError {
    fn from(value: DbError) -> Self {
        Self::Connection(value)
    }
}

impl From<rusqlite::Error> for DataAccessError {
    fn from(value: rusqlite::Error) -> Self {
        match &value {
            rusqlite::Error::SqliteFailure(err, _) => match err.code {
                ErrorCode::ConstraintViolation => Self::Constraint(value),
                ErrorCode::OperationInterrupted => Self::Timeout,
                ErrorCode::CannotOpen | ErrorCode::NotADatabase => {
                    Self::Connection(DbError::Open(value))
                }
                _ => Self::Sqlite(value),
            },
            rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::IntegralValueOutOfRange(..)
            | rusqlite::Error::InvalidColumnName(_)
            | rusqlite::Error::InvalidColumnIndex(_) => Self::InvalidData(value.to_string()),
            _ => Self::Sqlite(value),
        }
    }
}
