use std::fmt::Debug;

use crate::error::Result;
use crate::types::{DataType, Row};

/// SQL flavour spoken by a driver.
///
/// Controls placeholder style and which optional clauses the query builders
/// emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Numbered `$1, $2, ...` placeholders; supports row locking.
    #[default]
    Postgres,
    /// Anonymous `?` placeholders; no row-locking clauses.
    Sqlite,
}

impl Dialect {
    /// Whether `SELECT ... FOR UPDATE` style locking clauses are understood.
    #[must_use]
    pub const fn supports_row_locks(self) -> bool {
        matches!(self, Self::Postgres)
    }
}

/// SQL drivers implement the [`Connection`] trait to let the ORM execute
/// statements against a backend (`SQLite`, Postgres, etc).
///
/// Calls block until the database round trip completes. A connection is not
/// assumed to be reentrant: callers serialize access to it.
pub trait Connection: Debug + Send + Sync + 'static {
    /// The dialect used when building statements for this connection.
    fn dialect(&self) -> Dialect;

    /// Execute a query and return the resulting rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is unusable or the statement fails.
    fn query(&self, sql: &str, params: &[DataType]) -> Result<Vec<Row>>;

    /// Execute a statement that does not return rows (e.g., an `INSERT`,
    /// `UPDATE`, or `DELETE`) and return the number of rows affected.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is unusable or the statement fails.
    fn exec(&self, sql: &str, params: &[DataType]) -> Result<u64>;

    /// Start a transaction on this connection.
    ///
    /// # Errors
    ///
    /// Returns an error if a transaction cannot be started.
    fn begin(&self) -> Result<()>;

    /// Commit the open transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit is rejected.
    fn commit(&self) -> Result<()>;

    /// Roll back the open transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    fn rollback(&self) -> Result<()>;

    /// Release the underlying handle. Later calls fail with
    /// [`Error::Connection`](crate::Error::Connection).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend reports a failure while closing.
    fn close(&self) -> Result<()>;
}

/// Implemented by drivers that can be opened from [`FromEnv`] options.
pub trait Backend: Sized + Sync + Send {
    /// The options used to connect to the backend.
    type ConnectOptions: FromEnv;

    /// Connect using options loaded from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the options cannot be loaded or the connection
    /// cannot be opened.
    fn connect() -> anyhow::Result<Self> {
        Self::connect_with(Self::ConnectOptions::from_env()?)
    }

    /// Connect with the specified options.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be opened.
    fn connect_with(options: Self::ConnectOptions) -> anyhow::Result<Self>;
}

/// Trait for creating connection options from environment variables.
pub trait FromEnv: Sized {
    /// Create connection options from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    fn from_env() -> anyhow::Result<Self>;
}
