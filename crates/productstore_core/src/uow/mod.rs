//! Unit of work: one connection, one live transaction, cached repositories.
//!
//! # Responsibility
//! - Bound a sequence of repository calls to one atomic transaction.
//! - Commit or roll back, then transparently open the next transaction.
//! - Release the connection deterministically at scope exit.
//!
//! # Invariants
//! - While not disposed, exactly one transaction is open.
//! - Cached repositories are discarded whenever the transaction is replaced.
//! - After disposal every operation fails with `DataAccessError::Disposed`.

mod factory;
mod slot;
mod sqlite_uow;

pub use factory::UnitOfWorkFactory;
pub use slot::RepositorySlot;
pub use sqlite_uow::SqliteUnitOfWork;

use crate::error::{DataAccessError, DataResult};
use crate::repo::product_repo::ProductRepository;
use std::rc::Rc;

/// Lifecycle state of a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOfWorkState {
    /// A transaction is open and repositories may be used.
    Active,
    /// Transient: the current transaction is being ended and replaced.
    ///
    /// Only held while `commit` runs; callers observe `Active` again once it
    /// returns, or `Disposed` when no new transaction could be begun.
    Committing,
    /// Terminal: connection released.
    Disposed,
}

/// What happened to the transaction a `commit` call ended.
#[derive(Debug)]
pub enum CommitOutcome {
    Committed,
    /// The store refused the commit; the transaction was rolled back instead.
    RolledBack(DataAccessError),
}

impl CommitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed)
    }
}

/// Transaction-scoped access to the product store.
pub trait UnitOfWork {
    type Products: ProductRepository;

    /// Repository bound to the current transaction, built on first access.
    fn products(&mut self) -> DataResult<Rc<Self::Products>>;

    /// Ends the current transaction and opens a fresh one.
    ///
    /// See `CommitMode` for how a refused commit is reported.
    fn commit(&mut self) -> DataResult<CommitOutcome>;

    /// Discards the current transaction's work and opens a fresh one.
    fn rollback(&mut self) -> DataResult<()>;

    /// Releases the transaction and connection. Safe to call repeatedly.
    fn dispose(&mut self);

    fn state(&self) -> UnitOfWorkState;
}
