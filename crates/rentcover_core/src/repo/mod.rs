//! Repository layer over the ledger tables.
//!
//! # Responsibility
//! - Define the storage boundary used by services: read by key, read by
//!   foreign key, insert, and version-checked update.
//! - Isolate SQLite query details from lifecycle orchestration.
//!
//! # Invariants
//! - Aggregate updates (`users`, `contracts`) are compare-and-swap on `version`.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::ValidationError;
use rusqlite::ErrorCode;
use thiserror::Error;

pub mod ledger_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error for ledger reads and writes.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("{entity} already exists: {id}")]
    Duplicate { entity: &'static str, id: String },
    #[error("{entity} {id} was modified concurrently (expected version {expected})")]
    StaleVersion {
        entity: &'static str,
        id: String,
        expected: i64,
    },
    #[error("invalid persisted ledger data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl RepoError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether retrying the whole unit of work may succeed.
    ///
    /// True for lock timeouts (`SQLITE_BUSY`, `SQLITE_LOCKED`) and lost
    /// optimistic-version races.
    pub fn is_contention(&self) -> bool {
        match self {
            Self::StaleVersion { .. } => true,
            Self::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(err, _))) => matches!(
                err.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}
