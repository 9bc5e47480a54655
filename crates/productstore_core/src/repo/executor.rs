//! Parameterized statement executor bound to one transaction.
//!
//! # Responsibility
//! - Run SQL against the bound connection inside the bound transaction.
//! - Bind named parameters, enforce per-statement timeouts.
//! - Map rows to typed values and enforce row cardinality.
//!
//! # Invariants
//! - Every call re-checks that the bound transaction is still live.
//! - A timeout never outlives the statement it was armed for.

use crate::db::TransactionHandle;
use crate::error::{CardinalityError, DataAccessError, DataResult};
use crate::repo::grid::GridReader;
use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::{FromSql, Value};
use rusqlite::{Connection, Row, Statement};
use std::borrow::Cow;
use std::os::raw::c_int;
use std::time::{Duration, Instant};

/// Virtual machine steps between two deadline checks of a timed statement.
const PROGRESS_HANDLER_OPS: c_int = 1_000;

static TABLE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid table name regex"));

/// Maps one result row to a value.
pub trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// How the text of a `Command` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementKind {
    /// Plain SQL text.
    #[default]
    Text,
    /// The text names a table; every row of it is selected.
    TableDirect,
}

/// One statement invocation: SQL text plus bindings and options.
#[derive(Debug, Clone, Default)]
pub struct Command {
    sql: String,
    params: Vec<(String, Value)>,
    timeout: Option<Duration>,
    kind: StatementKind,
}

impl Command {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            ..Self::default()
        }
    }

    pub fn table(name: impl Into<String>) -> Self {
        Self::new(name).kind(StatementKind::TableDirect)
    }

    /// Binds a named parameter.
    ///
    /// Names may carry the `:`, `@` or `$` prefix used in the SQL text; bare
    /// names are bound as `:name`. Parameters the statement does not reference
    /// are ignored.
    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        let name = if name.starts_with([':', '@', '$']) {
            name.to_string()
        } else {
            format!(":{name}")
        };
        self.params.push((name, value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn kind(mut self, kind: StatementKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub(crate) fn params(&self) -> &[(String, Value)] {
        &self.params
    }

    pub(crate) fn timeout_value(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn statement_kind(&self) -> StatementKind {
        self.kind
    }

    fn resolved_sql(&self) -> DataResult<Cow<'_, str>> {
        match self.kind {
            StatementKind::Text => Ok(Cow::Borrowed(self.sql.as_str())),
            StatementKind::TableDirect => {
                let table = self.sql.trim();
                if !TABLE_NAME_RE.is_match(table) {
                    return Err(DataAccessError::InvalidStatement(format!(
                        "`{table}` is not a valid table name"
                    )));
                }
                Ok(Cow::Owned(format!("SELECT * FROM \"{table}\"")))
            }
        }
    }
}

/// Statement executor bound to one transaction of a unit of work.
///
/// Not `Send`: an executor belongs to the thread that owns its unit of work.
#[derive(Debug, Clone)]
pub struct SqlExecutor {
    tx: TransactionHandle,
}

impl SqlExecutor {
    pub fn new(tx: TransactionHandle) -> Self {
        Self { tx }
    }

    pub fn transaction(&self) -> &TransactionHandle {
        &self.tx
    }

    /// Exactly one row; `NoRows` or `MultipleRows` otherwise.
    pub fn query_single<T: FromRow>(&self, command: &Command) -> DataResult<T> {
        let mut rows = self.fetch_at_most(command, 2, "single")?;
        match rows.len() {
            0 => Err(CardinalityError::NoRows.into()),
            1 => Ok(rows.remove(0)),
            _ => Err(CardinalityError::MultipleRows.into()),
        }
    }

    /// Zero or one row; `MultipleRows` for more.
    pub fn query_optional<T: FromRow>(&self, command: &Command) -> DataResult<Option<T>> {
        let mut rows = self.fetch_at_most(command, 2, "optional")?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(Some(rows.remove(0))),
            _ => Err(CardinalityError::MultipleRows.into()),
        }
    }

    /// First row of a non-empty result.
    pub fn query_first<T: FromRow>(&self, command: &Command) -> DataResult<T> {
        self.query_first_optional(command)?
            .ok_or(DataAccessError::Cardinality(CardinalityError::NoRows))
    }

    pub fn query_first_optional<T: FromRow>(&self, command: &Command) -> DataResult<Option<T>> {
        Ok(self.fetch_at_most(command, 1, "first")?.pop())
    }

    /// All rows, in result order. An empty result is an empty vector.
    pub fn query<T: FromRow>(&self, command: &Command) -> DataResult<Vec<T>> {
        self.fetch_at_most(command, usize::MAX, "multi")
    }

    /// Runs a statement without a result set and returns the affected-row count.
    pub fn execute(&self, command: &Command) -> DataResult<usize> {
        self.run(command, "execute", |stmt| Ok(stmt.raw_execute()?))
    }

    /// Runs a statement and returns the first column of its first row, if any.
    ///
    /// Used for `INSERT ... RETURNING` and aggregate lookups.
    pub fn execute_scalar<T: FromSql>(&self, command: &Command) -> DataResult<Option<T>> {
        self.run(command, "scalar", |stmt| {
            let mut rows = stmt.raw_query();
            match rows.next()? {
                Some(row) => Ok(Some(row.get(0)?)),
                None => Ok(None),
            }
        })
    }

    /// Executes a batch and returns a forward-only reader over its result sets.
    ///
    /// Only `StatementKind::Text` batches are accepted. The timeout, if any,
    /// is one deadline for the whole batch, armed only while a read runs.
    pub fn query_multiple<'a>(&'a self, command: &'a Command) -> DataResult<GridReader<'a>> {
        if command.statement_kind() != StatementKind::Text {
            return Err(DataAccessError::InvalidStatement(
                "multi-result-set batches must be plain SQL text".to_string(),
            ));
        }
        let conn = self.tx.connection()?;
        Ok(GridReader::new(
            &self.tx,
            conn,
            command.sql(),
            command.params(),
            command.timeout_value().map(|timeout| Instant::now() + timeout),
        ))
    }

    fn fetch_at_most<T: FromRow>(
        &self,
        command: &Command,
        limit: usize,
        op: &'static str,
    ) -> DataResult<Vec<T>> {
        self.run(command, op, |stmt| collect_rows(stmt, limit))
    }

    fn run<T>(
        &self,
        command: &Command,
        op: &'static str,
        body: impl FnOnce(&mut Statement<'_>) -> DataResult<T>,
    ) -> DataResult<T> {
        let started_at = Instant::now();
        let conn = self.tx.connection()?;
        let sql = command.resolved_sql()?;
        let _timeout = TimeoutGuard::arm(conn, command.timeout_value());

        let mut stmt = conn.prepare(&sql)?;
        bind_named(&mut stmt, command.params())?;
        let result = body(&mut stmt);

        trace!(
            "event=sql_run module=repo status={} op={op} generation={} duration_ms={}",
            if result.is_ok() { "ok" } else { "error" },
            self.tx.generation(),
            started_at.elapsed().as_millis()
        );
        result
    }
}

pub(crate) fn bind_named(stmt: &mut Statement<'_>, params: &[(String, Value)]) -> DataResult<()> {
    for (name, value) in params {
        if let Some(index) = stmt.parameter_index(name)? {
            stmt.raw_bind_parameter(index, value)?;
        }
    }
    Ok(())
}

pub(crate) fn collect_rows<T: FromRow>(
    stmt: &mut Statement<'_>,
    limit: usize,
) -> DataResult<Vec<T>> {
    let mut rows = stmt.raw_query();
    let mut mapped = Vec::new();
    while mapped.len() < limit {
        match rows.next()? {
            Some(row) => mapped.push(T::from_row(row)?),
            None => break,
        }
    }
    Ok(mapped)
}

/// Arms the connection's progress handler with a deadline; disarms on drop.
pub(crate) struct TimeoutGuard<'conn> {
    conn: &'conn Connection,
    armed: bool,
}

impl<'conn> TimeoutGuard<'conn> {
    pub(crate) fn arm(conn: &'conn Connection, timeout: Option<Duration>) -> Self {
        Self::until(conn, timeout.map(|timeout| Instant::now() + timeout))
    }

    pub(crate) fn until(conn: &'conn Connection, deadline: Option<Instant>) -> Self {
        if let Some(deadline) = deadline {
            conn.progress_handler(PROGRESS_HANDLER_OPS, Some(move || Instant::now() >= deadline));
        }
        Self {
            conn,
            armed: deadline.is_some(),
        }
    }
}

impl Drop for TimeoutGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.conn.progress_handler(0, None::<fn() -> bool>);
        }
    }
}

macro_rules! scalar_from_row {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromRow for $ty {
                fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
                    row.get(0)
                }
            }
        )*
    };
}

scalar_from_row!(i64, f64, String, bool);

impl<T: FromSql> FromRow for Option<T> {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        row.get(0)
    }
}
