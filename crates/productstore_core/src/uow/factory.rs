//! Request-scoped unit-of-work provider.

use super::SqliteUnitOfWork;
use crate::config::StoreConfig;
use crate::error::DataResult;

/// Creates one unit of work per request scope from shared settings.
#[derive(Debug, Clone)]
pub struct UnitOfWorkFactory {
    config: StoreConfig,
}

impl UnitOfWorkFactory {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Opens a fresh unit of work; it is disposed when dropped.
    pub fn create(&self) -> DataResult<SqliteUnitOfWork> {
        SqliteUnitOfWork::open(&self.config)
    }

    /// Runs `body` against a fresh unit of work and disposes it afterwards.
    ///
    /// Uncommitted work is rolled back on exit, including when `body` panics.
    pub fn scope<T>(&self, body: impl FnOnce(&mut SqliteUnitOfWork) -> T) -> DataResult<T> {
        let mut uow = self.create()?;
        Ok(body(&mut uow))
    }
}
