//! Database error vocabulary shared by every repository
//!
//! Store-specific failures are translated into [`DatabaseError`] so that the
//! layers above never depend on `sqlx` error variants directly.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// No row matched the lookup or mutation
    #[error("record not found")]
    NotFound,

    /// An insert collided with a unique constraint
    #[error("record already exists")]
    AlreadyExists,

    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// Translate a query error, keeping "no rows" apart from other failures
    pub fn from_query(err: SqlxError) -> Self {
        match err {
            SqlxError::RowNotFound => DatabaseError::NotFound,
            other => DatabaseError::Query(other),
        }
    }

    /// Translate an insert error, keeping unique violations apart
    pub fn from_insert(err: SqlxError) -> Self {
        match err.as_database_error() {
            Some(db) if db.is_unique_violation() => DatabaseError::AlreadyExists,
            _ => DatabaseError::Query(err),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound)
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
