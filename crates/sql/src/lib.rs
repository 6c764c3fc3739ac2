//! # SQL driver boundary
//!
//! This crate defines the blocking contract the `strata` ORM uses to talk to a
//! database: positional-parameter statements in, [`Row`]s or an affected-row
//! count out, plus transaction primitives. A lightweight `SQLite` driver is
//! bundled for development and tests.

#![forbid(unsafe_code)]

mod connection;
mod error;
pub mod sqlite;
mod types;

pub use crate::connection::{Backend, Connection, Dialect, FromEnv};
pub use crate::error::{Error, Result};
pub use crate::sqlite::{ConnectOptions, Sqlite};
pub use crate::types::{DataType, Field, Row};
