//! SQLite unit of work.
//!
//! # Responsibility
//! - Own one bootstrapped connection and its single live transaction.
//! - Cache transaction-bound repositories and invalidate them on reset.
//! - Apply the configured `CommitMode` when the store refuses a commit.
//!
//! # Invariants
//! - `session` is `Some` exactly while the state is not `Disposed`.
//! - Instances are `!Send`; one thread drives a unit of work at a time.

use super::{CommitOutcome, RepositorySlot, UnitOfWork, UnitOfWorkState};
use crate::config::{CommitMode, StoreConfig};
use crate::db::open_connection;
use crate::db::session::Session;
use crate::db::TransactionHandle;
use crate::error::{DataAccessError, DataResult};
use crate::repo::executor::SqlExecutor;
use crate::repo::product_repo::SqliteProductRepository;
use log::{debug, info, warn};
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

pub struct SqliteUnitOfWork {
    id: Uuid,
    commit_mode: CommitMode,
    session: Option<Rc<Session>>,
    state: UnitOfWorkState,
    products: RepositorySlot<SqliteProductRepository>,
}

impl SqliteUnitOfWork {
    /// Opens a connection per `config` and begins the first transaction.
    ///
    /// # Errors
    /// - `Connection` when the database cannot be opened, bootstrapped or
    ///   the first transaction cannot begin.
    pub fn open(config: &StoreConfig) -> DataResult<Self> {
        let id = Uuid::new_v4();
        let conn = open_connection(config)?;
        let session = Rc::new(Session::new(conn));
        session.begin()?;

        info!(
            "event=uow_open module=uow status=ok uow_id={id} commit_mode={:?}",
            config.commit_mode
        );
        Ok(Self {
            id,
            commit_mode: config.commit_mode,
            session: Some(session),
            state: UnitOfWorkState::Active,
            products: RepositorySlot::new(),
        })
    }

    /// Correlation id used in log events of this instance.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn commit_mode(&self) -> CommitMode {
        self.commit_mode
    }

    /// Executor bound to the current transaction, for ad-hoc statements.
    pub fn executor(&self) -> DataResult<SqlExecutor> {
        Ok(SqlExecutor::new(self.current_transaction()?))
    }

    /// Generation number of the live transaction (1 for the first).
    pub fn transaction_generation(&self) -> DataResult<u64> {
        Ok(self.current_transaction()?.generation())
    }

    fn live_session(&self) -> DataResult<&Rc<Session>> {
        self.session.as_ref().ok_or(DataAccessError::Disposed)
    }

    fn current_transaction(&self) -> DataResult<TransactionHandle> {
        Ok(TransactionHandle::new(Rc::clone(self.live_session()?)))
    }

    /// Drops cached repositories and opens the next transaction.
    ///
    /// A failure to begin leaves no usable transaction, so the instance is
    /// disposed before the error is returned.
    fn renew_transaction(&mut self, session: &Session) -> DataResult<()> {
        self.products.clear();
        match session.begin() {
            Ok(generation) => {
                self.state = UnitOfWorkState::Active;
                debug!(
                    "event=uow_renew module=uow status=ok uow_id={} generation={generation}",
                    self.id
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=uow_renew module=uow status=error uow_id={} error={}",
                    self.id, err
                );
                self.dispose();
                Err(err)
            }
        }
    }
}

impl UnitOfWork for SqliteUnitOfWork {
    type Products = SqliteProductRepository;

    fn products(&mut self) -> DataResult<Rc<SqliteProductRepository>> {
        let tx = self.current_transaction()?;
        Ok(self
            .products
            .get_or_build(|| SqliteProductRepository::new(SqlExecutor::new(tx))))
    }

    fn commit(&mut self) -> DataResult<CommitOutcome> {
        let session = Rc::clone(self.live_session()?);
        self.state = UnitOfWorkState::Committing;

        let committed = if session.is_aborted() {
            Err(DataAccessError::TransactionAborted)
        } else {
            session.commit()
        };
        let outcome = match committed {
            Ok(()) => {
                debug!("event=uow_commit module=uow status=ok uow_id={}", self.id);
                CommitOutcome::Committed
            }
            Err(err) => {
                warn!(
                    "event=uow_commit module=uow status=error uow_id={} error={}",
                    self.id, err
                );
                if let Err(rollback_err) = session.rollback() {
                    warn!(
                        "event=uow_rollback module=uow status=error uow_id={} error={}",
                        self.id, rollback_err
                    );
                }
                CommitOutcome::RolledBack(err)
            }
        };

        self.renew_transaction(&session)?;

        match (self.commit_mode, outcome) {
            (CommitMode::Strict, CommitOutcome::RolledBack(cause)) => {
                Err(DataAccessError::CommitFailed(Box::new(cause)))
            }
            (_, outcome) => Ok(outcome),
        }
    }

    fn rollback(&mut self) -> DataResult<()> {
        let session = Rc::clone(self.live_session()?);
        let rolled_back = session.rollback();
        if let Err(err) = &rolled_back {
            warn!(
                "event=uow_rollback module=uow status=error uow_id={} error={}",
                self.id, err
            );
        }
        self.renew_transaction(&session)?;
        rolled_back
    }

    fn dispose(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.state = UnitOfWorkState::Disposed;
        self.products.clear();

        if session.has_open_transaction() {
            if let Err(err) = session.rollback() {
                warn!(
                    "event=uow_dispose module=uow status=error uow_id={} stage=rollback error={}",
                    self.id, err
                );
            }
        }
        session.mark_closed();

        // Outstanding repository handles keep the connection alive until they drop.
        match Rc::try_unwrap(session) {
            Ok(session) => {
                if let Err((_, err)) = session.into_connection().close() {
                    warn!(
                        "event=uow_dispose module=uow status=error uow_id={} stage=close error={}",
                        self.id, err
                    );
                }
            }
            Err(_) => debug!(
                "event=uow_dispose module=uow status=deferred uow_id={} reason=repository_handles_alive",
                self.id
            ),
        }
        info!("event=uow_dispose module=uow status=ok uow_id={}", self.id);
    }

    fn state(&self) -> UnitOfWorkState {
        self.state
    }
}

impl fmt::Debug for SqliteUnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteUnitOfWork")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("commit_mode", &self.commit_mode)
            .finish()
    }
}

impl Drop for SqliteUnitOfWork {
    fn drop(&mut self) {
        self.dispose();
    }
}
