//! Forward-only reader over the result sets of a SQL batch.
//!
//! # Invariants
//! - Result sets are read strictly in batch order; nothing is re-read.
//! - Statements without result columns are executed and skipped.
//! - Every read re-checks the bound transaction; a reader never runs
//!   statements after its transaction ended.
//! - The batch deadline is armed only for the duration of a read.
//! - Dropping the reader releases it; unread statements are never executed.

use crate::db::TransactionHandle;
use crate::error::{CardinalityError, DataAccessError, DataResult};
use crate::repo::executor::{bind_named, collect_rows, FromRow, TimeoutGuard};
use rusqlite::types::Value;
use rusqlite::{Batch, Connection, Statement};
use std::time::Instant;

pub struct GridReader<'a> {
    tx: &'a TransactionHandle,
    batch: Batch<'a, 'a>,
    params: &'a [(String, Value)],
    deadline: Option<Instant>,
    consumed: bool,
}

impl<'a> GridReader<'a> {
    pub(crate) fn new(
        tx: &'a TransactionHandle,
        conn: &'a Connection,
        sql: &'a str,
        params: &'a [(String, Value)],
        deadline: Option<Instant>,
    ) -> Self {
        Self {
            tx,
            batch: Batch::new(conn, sql),
            params,
            deadline,
            consumed: false,
        }
    }

    /// Reads every row of the next result set.
    pub fn read<T: FromRow>(&mut self) -> DataResult<Vec<T>> {
        self.next_rows(usize::MAX)
    }

    /// Reads the next result set, which must hold exactly one row.
    pub fn read_single<T: FromRow>(&mut self) -> DataResult<T> {
        let mut rows = self.next_rows(2)?;
        match rows.len() {
            0 => Err(CardinalityError::NoRows.into()),
            1 => Ok(rows.remove(0)),
            _ => Err(CardinalityError::MultipleRows.into()),
        }
    }

    /// Reads the next result set, which may hold at most one row.
    pub fn read_optional<T: FromRow>(&mut self) -> DataResult<Option<T>> {
        let mut rows = self.next_rows(2)?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            _ => Err(CardinalityError::MultipleRows.into()),
        }
    }

    /// Reads the first row of the next result set.
    pub fn read_first<T: FromRow>(&mut self) -> DataResult<T> {
        self.next_rows(1)?
            .pop()
            .ok_or(DataAccessError::Cardinality(CardinalityError::NoRows))
    }

    /// Whether a read has already run past the last result set of the batch.
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    fn next_rows<T: FromRow>(&mut self, limit: usize) -> DataResult<Vec<T>> {
        if self.consumed {
            return Err(DataAccessError::ResultSetsExhausted);
        }
        let tx = self.tx;
        let conn = tx.connection()?;
        let _timeout = TimeoutGuard::until(conn, self.deadline);
        let mut stmt = self.next_result_set()?;
        collect_rows(&mut stmt, limit)
    }

    fn next_result_set(&mut self) -> DataResult<Statement<'a>> {
        while let Some(mut stmt) = self.batch.next()? {
            bind_named(&mut stmt, self.params)?;
            if stmt.column_count() == 0 {
                stmt.raw_execute()?;
                continue;
            }
            return Ok(stmt);
        }
        self.consumed = true;
        Err(DataAccessError::ResultSetsExhausted)
    }
}
