//! Connection-plus-transaction session owned by one unit of work.
//!
//! # Responsibility
//! - Own the SQLite connection of a unit of work.
//! - Begin, commit and roll back the single live transaction.
//! - Hand out `TransactionHandle`s that detect when their transaction ended.
//!
//! # Invariants
//! - At most one transaction is open at a time.
//! - Every `begin` bumps the generation; handles from older generations are stale.
//! - Once closed, a session never opens another transaction.
//! - A transaction SQLite rolled back on its own (interrupted write) is
//!   aborted: handles report `TransactionAborted` until the next `begin`.

use crate::db::DbError;
use crate::error::{DataAccessError, DataResult};
use log::debug;
use rusqlite::Connection;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

pub(crate) struct Session {
    conn: Connection,
    generation: Cell<u64>,
    in_transaction: Cell<bool>,
    closed: Cell<bool>,
}

impl Session {
    pub(crate) fn new(conn: Connection) -> Self {
        Self {
            conn,
            generation: Cell::new(0),
            in_transaction: Cell::new(false),
            closed: Cell::new(false),
        }
    }

    /// Opens a new deferred transaction and returns its generation.
    pub(crate) fn begin(&self) -> DataResult<u64> {
        if self.closed.get() {
            return Err(DataAccessError::Disposed);
        }
        self.conn
            .execute_batch("BEGIN DEFERRED;")
            .map_err(|err| DataAccessError::Connection(DbError::Begin(err)))?;
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        self.in_transaction.set(true);
        debug!("event=tx_begin module=db status=ok generation={generation}");
        Ok(generation)
    }

    /// Commits the live transaction. The transaction counts as ended either way.
    pub(crate) fn commit(&self) -> DataResult<()> {
        self.in_transaction.set(false);
        self.conn.execute_batch("COMMIT;")?;
        Ok(())
    }

    /// Rolls back whatever transaction is still open on the connection.
    ///
    /// SQLite may already have rolled back on its own (interrupted write,
    /// failed commit of some kinds); that case is a no-op.
    pub(crate) fn rollback(&self) -> DataResult<()> {
        self.in_transaction.set(false);
        if self.conn.is_autocommit() {
            return Ok(());
        }
        self.conn.execute_batch("ROLLBACK;")?;
        Ok(())
    }

    pub(crate) fn has_open_transaction(&self) -> bool {
        self.in_transaction.get()
    }

    /// The live transaction was rolled back by SQLite behind our back.
    pub(crate) fn is_aborted(&self) -> bool {
        self.in_transaction.get() && self.conn.is_autocommit()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.get()
    }

    pub(crate) fn mark_closed(&self) {
        self.in_transaction.set(false);
        self.closed.set(true);
    }

    pub(crate) fn into_connection(self) -> Connection {
        self.conn
    }
}

/// Binding of a repository or executor to one transaction of a session.
#[derive(Clone)]
pub struct TransactionHandle {
    session: Rc<Session>,
    generation: u64,
}

impl fmt::Debug for TransactionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionHandle")
            .field("generation", &self.generation)
            .field("current", &self.is_current())
            .finish()
    }
}

impl TransactionHandle {
    pub(crate) fn new(session: Rc<Session>) -> Self {
        let generation = session.generation();
        Self {
            session,
            generation,
        }
    }

    /// Returns the connection if the bound transaction is still the live one.
    ///
    /// # Errors
    /// - `Disposed` when the owning unit of work was disposed.
    /// - `StaleTransaction` when the bound transaction was committed or rolled back.
    /// - `TransactionAborted` when SQLite rolled the transaction back itself.
    pub fn connection(&self) -> DataResult<&Connection> {
        if self.session.closed.get() {
            return Err(DataAccessError::Disposed);
        }
        if !self.is_bound_generation() {
            return Err(DataAccessError::StaleTransaction);
        }
        if self.session.is_aborted() {
            return Err(DataAccessError::TransactionAborted);
        }
        Ok(&self.session.conn)
    }

    /// Whether this handle's transaction is still open and usable.
    pub fn is_current(&self) -> bool {
        self.is_bound_generation() && !self.session.is_aborted()
    }

    fn is_bound_generation(&self) -> bool {
        self.session.has_open_transaction() && self.session.generation() == self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
