//! Errors

use thiserror::Error;

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the ORM surfaces, classified by kind.
#[derive(Error, Debug)]
pub enum Error {
    /// The connection could not be opened or is no longer usable.
    #[error("connection error: {0}")]
    Connection(String),

    /// Malformed statement or a driver-reported statement failure.
    #[error("query error: {0}")]
    Query(String),

    /// Primary-key, unique or foreign-key violation on write.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// A row could not be decoded into the requested type.
    #[error("mapping error: {0}")]
    Mapping(String),

    /// Zero rows where exactly one was required.
    #[error("record not found in {table}")]
    NotFound { table: &'static str },

    /// A transaction failed and rolling it back failed as well.
    #[error("{source}; rollback failed: {rollback}")]
    Rollback { source: Box<Self>, rollback: Box<Self> },
}

impl Error {
    /// Returns `true` for [`Error::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for [`Error::Constraint`].
    #[must_use]
    pub const fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }

    pub(crate) fn mapping(table: &str, err: &anyhow::Error) -> Self {
        Self::Mapping(format!("{table}: {err:#}"))
    }
}

impl From<strata_sql::Error> for Error {
    fn from(err: strata_sql::Error) -> Self {
        match err {
            strata_sql::Error::Connection(msg) => Self::Connection(msg),
            strata_sql::Error::Constraint(msg) => Self::Constraint(msg),
            strata_sql::Error::Statement(msg) => Self::Query(msg),
        }
    }
}
