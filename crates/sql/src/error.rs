//! Driver errors

use thiserror::Error;

/// Result type returned by drivers.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a driver, classified so callers can tell a broken
/// connection from a rejected statement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The connection could not be opened or is no longer usable.
    #[error("connection: {0}")]
    Connection(String),

    /// A primary-key, unique, foreign-key or check constraint rejected a write.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The statement was malformed or the database refused to run it.
    #[error("statement failed: {0}")]
    Statement(String),
}
