//! Connection bootstrap utilities for the ledger database.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::DbResult;
use crate::config::LedgerConfig;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens (or creates) a ledger database file and applies pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_db_with_config(path, &LedgerConfig::default())
}

/// Like [`open_db`], with `config.lock_wait_ms` as the connection's busy
/// timeout. This is the only place the ledger sets that timeout.
pub fn open_db_with_config(path: impl AsRef<Path>, config: &LedgerConfig) -> DbResult<Connection> {
    open_with("file", config.lock_wait(), || Connection::open(path))
}

/// Opens an in-memory ledger database with all migrations applied.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with(
        "memory",
        LedgerConfig::default().lock_wait(),
        Connection::open_in_memory,
    )
}

fn open_with(
    mode: &'static str,
    lock_wait: Duration,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = connect().map_err(|err| {
        error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={err}",
            started_at.elapsed().as_millis()
        );
        err
    })?;

    if let Err(err) = bootstrap_connection(&mut conn, lock_wait) {
        error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={err}",
            started_at.elapsed().as_millis()
        );
        return Err(err);
    }

    info!(
        "event=db_open module=db status=ok mode={mode} duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn bootstrap_connection(conn: &mut Connection, lock_wait: Duration) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(lock_wait)?;
    apply_migrations(conn)?;
    Ok(())
}
