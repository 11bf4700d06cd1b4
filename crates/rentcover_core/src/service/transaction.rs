//! Unit-of-work runner shared by mutating services.
//!
//! # Responsibility
//! - Run one service operation inside one `BEGIN IMMEDIATE` transaction.
//! - Retry contended attempts with bounded exponential backoff.
//!
//! # Invariants
//! - Nothing is committed unless the whole closure succeeds.
//! - After `max_attempts` contended attempts the caller gets a busy error.

use crate::config::LedgerConfig;
use crate::repo::ledger_repo::SqliteLedgerRepository;
use crate::repo::RepoError;
use log::{debug, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Service errors that can report lock contention.
pub(crate) trait ContentionError: From<RepoError> {
    fn is_contention(&self) -> bool;
    fn busy(operation: &'static str, attempts: u32) -> Self;
}

pub(crate) fn with_transaction<T, E, F>(
    conn: &Connection,
    config: &LedgerConfig,
    operation: &'static str,
    mut work: F,
) -> Result<T, E>
where
    E: ContentionError,
    F: FnMut(&SqliteLedgerRepository<'_>) -> Result<T, E>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match run_once(conn, &mut work) {
            Err(err) if err.is_contention() => {
                if attempt >= max_attempts {
                    warn!(
                        "event=tx_busy module=service status=error operation={operation} attempts={attempt}"
                    );
                    return Err(E::busy(operation, attempt));
                }
                let delay = config.backoff(attempt);
                debug!(
                    "event=tx_retry module=service status=retry operation={operation} attempt={attempt} delay_ms={}",
                    delay.as_millis()
                );
                std::thread::sleep(delay);
                attempt += 1;
            }
            outcome => return outcome,
        }
    }
}

fn run_once<T, E, F>(conn: &Connection, work: &mut F) -> Result<T, E>
where
    E: ContentionError,
    F: FnMut(&SqliteLedgerRepository<'_>) -> Result<T, E>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(RepoError::from)?;
    let value = work(&SqliteLedgerRepository::new_unchecked(&tx))?;
    tx.commit().map_err(RepoError::from)?;
    Ok(value)
}
