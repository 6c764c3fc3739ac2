//! Default `SQLite` driver.
//!
//! This is a lightweight implementation for development and tests.

#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]

use anyhow::Context;
use fromenv::FromEnv;
use parking_lot::Mutex;
use rusqlite::types::{Value as SqliteValue, ValueRef};
use rusqlite::{Connection as SqliteConnection, ErrorCode, params_from_iter};
use tracing::instrument;

use crate::connection::{Backend, Connection, Dialect};
use crate::error::{self, Error};
use crate::types::{DataType, Field, Row};

/// Options used to connect to the SQL database.
///
/// This struct is used to load connection options from environment variables.
#[derive(Debug, Clone, FromEnv)]
pub struct ConnectOptions {
    /// Database path, or `:memory:` for a private in-memory database.
    #[env(from = "SQL_DATABASE", default = ":memory:")]
    pub database: String,
}

impl crate::FromEnv for ConnectOptions {
    fn from_env() -> anyhow::Result<Self> {
        Self::from_env().finalize().context("issue loading connection options")
    }
}

/// `SQLite` implementation of [`Connection`].
#[derive(Debug)]
pub struct Sqlite {
    // `None` once closed. Mutex is necessary since rusqlite::Connection isn't `Sync`
    conn: Mutex<Option<SqliteConnection>>,
}

impl Backend for Sqlite {
    type ConnectOptions = ConnectOptions;

    #[instrument]
    fn connect_with(options: Self::ConnectOptions) -> anyhow::Result<Self> {
        tracing::debug!("initializing SQLite connection to: {}", options.database);
        Self::open(&options.database).context("failed to open SQLite database")
    }
}

impl Sqlite {
    /// Open the database at `path` (`:memory:` for an in-memory database).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the database cannot be opened.
    pub fn open(path: &str) -> error::Result<Self> {
        let conn =
            SqliteConnection::open(path).map_err(|e| Error::Connection(format!("{path}: {e}")))?;
        conn.execute_batch("PRAGMA foreign_keys = ON").map_err(classify)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&SqliteConnection) -> error::Result<T>) -> error::Result<T> {
        let guard = self.conn.lock();
        let conn = guard.as_ref().ok_or_else(|| Error::Connection("connection closed".into()))?;
        f(conn)
    }

    fn batch(&self, sql: &str) -> error::Result<()> {
        tracing::debug!("executing: {sql}");
        self.with_conn(|conn| conn.execute_batch(sql).map_err(classify))
    }
}

impl Connection for Sqlite {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn query(&self, sql: &str, params: &[DataType]) -> error::Result<Vec<Row>> {
        tracing::debug!("executing query: {sql}");

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql).map_err(classify)?;
            let sqlite_params =
                params.iter().map(datatype_to_sqlite_value).collect::<error::Result<Vec<_>>>()?;
            let column_names: Vec<String> =
                stmt.column_names().iter().map(ToString::to_string).collect();

            let mut rows = stmt.query(params_from_iter(sqlite_params.iter())).map_err(classify)?;

            let mut result_rows = Vec::new();
            let mut index = 0;
            while let Some(row) = rows.next().map_err(classify)? {
                let mut fields = Vec::with_capacity(column_names.len());
                for (i, name) in column_names.iter().enumerate() {
                    let value = row.get_ref(i).map_err(classify)?;
                    fields.push(Field {
                        name: name.clone(),
                        value: sqlite_value_to_datatype(value)?,
                    });
                }
                result_rows.push(Row {
                    index: index.to_string(),
                    fields,
                });
                index += 1;
            }

            Ok(result_rows)
        })
    }

    fn exec(&self, sql: &str, params: &[DataType]) -> error::Result<u64> {
        tracing::debug!("executing statement: {sql}");

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql).map_err(classify)?;
            let sqlite_params =
                params.iter().map(datatype_to_sqlite_value).collect::<error::Result<Vec<_>>>()?;
            let rows_affected =
                stmt.execute(params_from_iter(sqlite_params.iter())).map_err(classify)?;
            Ok(rows_affected as u64)
        })
    }

    fn begin(&self) -> error::Result<()> {
        self.batch("BEGIN")
    }

    fn commit(&self) -> error::Result<()> {
        self.batch("COMMIT")
    }

    fn rollback(&self) -> error::Result<()> {
        self.batch("ROLLBACK")
    }

    fn close(&self) -> error::Result<()> {
        let Some(conn) = self.conn.lock().take() else {
            return Ok(());
        };
        conn.close().map_err(|(_, e)| Error::Connection(e.to_string()))
    }
}

fn classify(err: rusqlite::Error) -> Error {
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => Error::Constraint(err.to_string()),
        Some(ErrorCode::CannotOpen | ErrorCode::NotADatabase) => {
            Error::Connection(err.to_string())
        }
        _ => Error::Statement(err.to_string()),
    }
}

fn datatype_to_sqlite_value(dt: &DataType) -> error::Result<SqliteValue> {
    let value = match dt {
        DataType::Boolean(Some(b)) => SqliteValue::Integer(i64::from(*b)),
        DataType::Int32(Some(i)) => SqliteValue::Integer(i64::from(*i)),
        DataType::Int64(Some(i)) => SqliteValue::Integer(*i),
        DataType::Uint32(Some(u)) => SqliteValue::Integer(i64::from(*u)),
        DataType::Uint64(Some(u)) => SqliteValue::Integer(i64::try_from(*u).map_err(|_| {
            Error::Statement(format!("unsigned value {u} exceeds SQLite's integer range"))
        })?),
        DataType::Float(Some(f)) => SqliteValue::Real(f64::from(*f)),
        DataType::Double(Some(f)) => SqliteValue::Real(*f),
        DataType::Str(Some(s))
        | DataType::Date(Some(s))
        | DataType::Time(Some(s))
        | DataType::Timestamp(Some(s)) => SqliteValue::Text(s.clone()),
        DataType::Binary(Some(b)) => SqliteValue::Blob(b.clone()),
        // All None variants map to NULL
        _ => SqliteValue::Null,
    };
    Ok(value)
}

fn sqlite_value_to_datatype(value: ValueRef) -> error::Result<DataType> {
    match value {
        ValueRef::Null => Ok(DataType::Str(None)),
        ValueRef::Integer(i) => Ok(DataType::Int64(Some(i))),
        ValueRef::Real(f) => Ok(DataType::Double(Some(f))),
        ValueRef::Text(t) => {
            let s = std::str::from_utf8(t)
                .map_err(|e| Error::Statement(format!("invalid UTF-8 in text value: {e}")))?;
            Ok(DataType::Str(Some(s.to_string())))
        }
        ValueRef::Blob(b) => Ok(DataType::Binary(Some(b.to_vec()))),
    }
}
