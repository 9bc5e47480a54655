//! Transaction-scoped product store.
//!
//! A `SqliteUnitOfWork` owns one SQLite connection and one live transaction,
//! lazily builds repositories bound to that transaction, and commits or rolls
//! back atomically before opening the next transaction.

pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod uow;

pub use config::{CommitMode, DatabaseTarget, StoreConfig};
pub use controller::product_controller::ProductController;
pub use controller::ActionResult;
pub use error::{CardinalityError, DataAccessError, DataResult};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::product::{Product, ProductId};
pub use repo::executor::{Command, FromRow, SqlExecutor, StatementKind};
pub use repo::grid::GridReader;
pub use repo::product_repo::{ProductRepository, SqliteProductRepository};
pub use repo::Repository;
pub use uow::{
    CommitOutcome, SqliteUnitOfWork, UnitOfWork, UnitOfWorkFactory, UnitOfWorkState,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
