//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections from a `StoreConfig`.
//! - Configure pragmas and busy timeout required by the unit of work.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.
//! - Returned connections are in autocommit mode (no transaction open).

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use crate::config::{DatabaseTarget, StoreConfig};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens the database described by `config` and applies pending migrations.
///
/// # Side effects
/// - Creates the database file when it does not exist yet.
/// - Emits `db_open` logging events with duration and status.
pub fn open_connection(config: &StoreConfig) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = config.database.mode();
    info!("event=db_open module=db status=start mode={mode}");

    let opened = match &config.database {
        DatabaseTarget::File(path) => Connection::open(path),
        DatabaseTarget::Memory => Connection::open_in_memory(),
    };
    let mut conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(DbError::Open(err));
        }
    };

    match bootstrap_connection(&mut conn, config.busy_timeout) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Opens a database file with default settings.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_connection(&StoreConfig::file(path.as_ref()))
}

/// Opens a private in-memory database with default settings.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_connection(&StoreConfig::in_memory())
}

fn bootstrap_connection(conn: &mut Connection, busy_timeout: Duration) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;").map_err(DbError::bootstrap("foreign_keys"))?;
    conn.busy_timeout(busy_timeout).map_err(DbError::bootstrap("busy_timeout"))?;
    apply_migrations(conn)
}
