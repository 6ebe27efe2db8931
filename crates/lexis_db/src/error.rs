//! Error types for the entity store.

use std::time::Duration;
use thiserror::Error;

/// Entity store result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Entity store errors.
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error (connection, query, decoding)
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// IO error (preparing the database directory)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Referenced row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint on a normalized composite key was violated
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// A composite key could not be derived from the entity's fields
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Query did not finish within its budget and was abandoned
    #[error("Timed out after {after:?} during {operation}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

// SQLITE_BUSY and SQLITE_LOCKED primary result codes.
const SQLITE_BUSY: &str = "5";
const SQLITE_LOCKED: &str = "6";

impl DbError {
    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a duplicate-key error.
    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::Duplicate(msg.into())
    }

    /// True when the backend itself could not serve the request (connection,
    /// pool exhaustion, lock contention, timeout). These are worth retrying.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Io(_) => true,
            Self::Sqlx(err) => match err {
                sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed
                | sqlx::Error::Io(_)
                | sqlx::Error::Tls(_) => true,
                sqlx::Error::Database(db) => matches!(
                    db.code().as_deref(),
                    Some(SQLITE_BUSY) | Some(SQLITE_LOCKED)
                ),
                _ => false,
            },
            _ => false,
        }
    }

    /// Rewrite constraint violations raised by an insert into domain errors.
    pub(crate) fn from_insert(err: DbError, what: &str) -> Self {
        if let Self::Sqlx(sqlx::Error::Database(db)) = &err {
            if db.is_unique_violation() {
                return Self::Duplicate(format!("{} already exists", what));
            }
            if db.is_foreign_key_violation() {
                return Self::NotFound(format!("{} references a missing parent row", what));
            }
        }
        err
    }
}
