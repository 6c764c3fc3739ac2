use std::fmt;
use std::sync::Arc;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use strata_sql::{Backend, Connection, Sqlite};

use crate::delete::delete_entity;
use crate::entity::{Entity, FromRow, RowView};
use crate::error::{Error, Result};
use crate::mutation::{self, WriteOptions};
use crate::query::Query;
use crate::transaction::{Tx, run};
use crate::{DataType, Dialect, Row};

/// Anything statements can be run against: the [`Db`] itself or an open
/// [`Tx`].
///
/// Builders take `&dyn Executor`, so the same code runs inside or outside
/// a transaction.
pub trait Executor {
    /// The connection statements are sent to.
    fn connection(&self) -> &dyn Connection;

    /// Dialect used when building statements.
    fn dialect(&self) -> Dialect {
        self.connection().dialect()
    }

    /// Run a row-returning statement.
    ///
    /// # Errors
    ///
    /// Returns the driver's error, converted by kind.
    fn fetch(&self, query: &Query) -> Result<Vec<Row>> {
        Ok(self.connection().query(&query.sql, &query.params)?)
    }

    /// Run a statement and return the number of rows affected.
    ///
    /// # Errors
    ///
    /// Returns the driver's error, converted by kind.
    fn execute(&self, query: &Query) -> Result<u64> {
        Ok(self.connection().exec(&query.sql, &query.params)?)
    }

    /// Execute raw SQL written in the connection's own placeholder style.
    ///
    /// # Errors
    ///
    /// Returns the driver's error, converted by kind.
    fn exec_raw(&self, sql: &str, params: &[DataType]) -> Result<u64> {
        tracing::debug!(sql, param_count = params.len(), "raw statement");
        Ok(self.connection().exec(sql, params)?)
    }

    /// Run a raw row-returning statement.
    ///
    /// # Errors
    ///
    /// Returns the driver's error, converted by kind.
    fn raw(&self, sql: &str, params: &[DataType]) -> Result<Vec<Row>> {
        tracing::debug!(sql, param_count = params.len(), "raw query");
        Ok(self.connection().query(sql, params)?)
    }

    /// Run a raw query and decode every row into `T`. Fields of `T` without
    /// a matching column take their default value.
    ///
    /// # Errors
    ///
    /// Returns the driver's error, or [`Error::Mapping`] if a row cannot be
    /// decoded.
    fn raw_as<T: FromRow>(&self, sql: &str, params: &[DataType]) -> Result<Vec<T>>
    where
        Self: Sized,
    {
        self.raw(sql, params)?
            .iter()
            .map(|row| {
                T::from_row(&RowView::new(row).partial(true))
                    .map_err(|e| Error::mapping("raw query", &e))
            })
            .collect()
    }

    /// Insert `entity` and its associations. Generated keys and timestamps
    /// are written back onto `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Constraint`] if the primary key already exists.
    fn create<M: Entity>(&self, entity: &mut M) -> Result<u64>
    where
        Self: Sized,
    {
        mutation::create(self, entity, WriteOptions::default())
    }

    /// Insert `entity` with explicit conflict and association handling.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Constraint`] on a key violation with
    /// [`Conflict::Reject`](crate::Conflict::Reject).
    fn create_with<M: Entity>(&self, entity: &mut M, options: WriteOptions) -> Result<u64>
    where
        Self: Sized,
    {
        mutation::create(self, entity, options)
    }

    /// Insert `entities` in chunks of `batch_size` rows (`0` for a single
    /// statement), returning the total number of rows written.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing chunk. Earlier chunks remain
    /// written unless called inside a transaction.
    fn create_batch<M: Entity>(&self, entities: &mut [M], batch_size: usize) -> Result<u64>
    where
        Self: Sized,
    {
        mutation::create_batch(self, entities, batch_size, WriteOptions::default())
    }

    /// Insert a new entity (zero primary key) or update every column of an
    /// existing one.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the underlying statements.
    fn save<M: Entity>(&self, entity: &mut M) -> Result<u64>
    where
        Self: Sized,
    {
        mutation::save(self, entity, WriteOptions::default())
    }

    /// [`Executor::save`] with explicit options.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the underlying statements.
    fn save_with<M: Entity>(&self, entity: &mut M, options: WriteOptions) -> Result<u64>
    where
        Self: Sized,
    {
        mutation::save(self, entity, options)
    }

    /// Delete `entity` by primary key (soft delete when `M` declares a marker).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Query`] if the primary key is zero.
    fn delete<M: Entity>(&self, entity: &M) -> Result<u64>
    where
        Self: Sized,
    {
        delete_entity(self, entity)
    }
}

/// Connection manager: a cheaply cloneable handle on one driver connection.
///
/// An open [`Tx`] owns the connection: statements from other threads, on
/// this handle or any clone, wait until it commits or rolls back. The owning
/// thread may keep using the handle directly; those statements join the
/// transaction.
#[derive(Clone)]
pub struct Db {
    conn: Arc<dyn Connection>,
    session: Arc<ReentrantMutex<()>>,
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db").field("dialect", &self.conn.dialect()).finish_non_exhaustive()
    }
}

impl Db {
    /// Wrap any driver connection.
    #[must_use]
    pub fn new(conn: impl Connection) -> Self {
        Self {
            conn: Arc::new(conn),
            session: Arc::new(ReentrantMutex::new(())),
        }
    }

    /// Open the bundled `SQLite` driver on `dsn` (a path or `:memory:`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the database cannot be opened.
    pub fn open(dsn: &str) -> Result<Self> {
        Ok(Self::new(Sqlite::open(dsn)?))
    }

    /// Open the bundled `SQLite` driver with options read from the
    /// environment (`SQL_DATABASE`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the options are invalid or the
    /// database cannot be opened.
    pub fn connect() -> Result<Self> {
        let sqlite = Sqlite::connect().map_err(|e| Error::Connection(format!("{e:#}")))?;
        Ok(Self::new(sqlite))
    }

    /// Release the connection. Every later call fails with
    /// [`Error::Connection`], on this handle and all its clones.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to close cleanly.
    pub fn close(&self) -> Result<()> {
        let _session = self.session.lock();
        Ok(self.conn.close()?)
    }

    /// Hold the connection for the calling thread.
    pub(crate) fn session(&self) -> ReentrantMutexGuard<'_, ()> {
        self.session.lock()
    }

    /// Start a transaction. It rolls back if dropped without
    /// [`Tx::commit`].
    ///
    /// Blocks while another thread holds a transaction on this connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver cannot begin a transaction.
    pub fn begin(&self) -> Result<Tx<'_>> {
        let session = self.session();
        self.conn.begin()?;
        tracing::debug!("transaction started");
        Ok(Tx::new(self, session))
    }

    /// Run `f` in a transaction: commit when it returns `Ok`, roll back when
    /// it returns `Err` or panics.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, a commit failure, or
    /// [`Error::Rollback`] when rolling back also fails.
    pub fn transaction<T>(&self, f: impl FnOnce(&Tx<'_>) -> Result<T>) -> Result<T> {
        run(self.begin()?, f)
    }
}

impl Executor for Db {
    fn connection(&self) -> &dyn Connection {
        &*self.conn
    }

    fn fetch(&self, query: &Query) -> Result<Vec<Row>> {
        let _session = self.session.lock();
        Ok(self.conn.query(&query.sql, &query.params)?)
    }

    fn execute(&self, query: &Query) -> Result<u64> {
        let _session = self.session.lock();
        Ok(self.conn.exec(&query.sql, &query.params)?)
    }

    fn exec_raw(&self, sql: &str, params: &[DataType]) -> Result<u64> {
        tracing::debug!(sql, param_count = params.len(), "raw statement");
        let _session = self.session.lock();
        Ok(self.conn.exec(sql, params)?)
    }

    fn raw(&self, sql: &str, params: &[DataType]) -> Result<Vec<Row>> {
        tracing::debug!(sql, param_count = params.len(), "raw query");
        let _session = self.session.lock();
        Ok(self.conn.query(sql, params)?)
    }
}
