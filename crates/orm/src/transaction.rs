//! Transaction boundaries.
//!
//! A [`Tx`] borrows its [`Db`] and must be finished with [`Tx::commit`] or
//! [`Tx::rollback`]; one dropped while still open is rolled back. Nested
//! transactions map onto savepoints of the enclosing one.
//!
//! A [`Tx`] keeps its thread's hold on the connection until it finishes, so
//! other threads cannot interleave statements with it.

use std::cell::Cell;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};

use parking_lot::ReentrantMutexGuard;
use strata_sql::Connection;

use crate::db::{Db, Executor};
use crate::error::{Error, Result};

/// An open transaction (or savepoint, when nested).
pub struct Tx<'a> {
    db: &'a Db,
    savepoint: Option<String>,
    depth: usize,
    open: bool,
    // released after the Drop rollback, never before
    _session: ReentrantMutexGuard<'a, ()>,
    // statements on one transaction are issued from one thread
    _not_sync: PhantomData<Cell<()>>,
}

impl<'a> Tx<'a> {
    pub(crate) const fn new(db: &'a Db, session: ReentrantMutexGuard<'a, ()>) -> Self {
        Self {
            db,
            savepoint: None,
            depth: 0,
            open: true,
            _session: session,
            _not_sync: PhantomData,
        }
    }

    /// Make every statement of this transaction permanent (or release the
    /// savepoint).
    ///
    /// # Errors
    ///
    /// Returns an error if the database rejects the commit; the transaction
    /// is then rolled back when dropped.
    pub fn commit(mut self) -> Result<()> {
        match &self.savepoint {
            Some(name) => self.exec(&format!("RELEASE SAVEPOINT {name}"))?,
            None => self.db.connection().commit()?,
        }
        self.open = false;
        tracing::debug!(depth = self.depth, "transaction committed");
        Ok(())
    }

    /// Discard every statement of this transaction (or since the savepoint).
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub fn rollback(mut self) -> Result<()> {
        self.open = false;
        self.undo()
    }

    /// Run `f` inside a savepoint of this transaction: released when `f`
    /// returns `Ok`, rolled back to when it returns `Err` or panics. The
    /// enclosing transaction stays usable either way.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or [`Error::Rollback`] when rolling back
    /// to the savepoint also fails.
    pub fn transaction<T>(&self, f: impl FnOnce(&Tx<'_>) -> Result<T>) -> Result<T> {
        let depth = self.depth + 1;
        let name = format!("strata_sp_{depth}");
        self.exec(&format!("SAVEPOINT {name}"))?;

        let nested = Tx {
            db: self.db,
            savepoint: Some(name),
            depth,
            open: true,
            _session: self.db.session(),
            _not_sync: PhantomData,
        };
        run(nested, f)
    }

    fn undo(&self) -> Result<()> {
        match &self.savepoint {
            Some(name) => {
                self.exec(&format!("ROLLBACK TO SAVEPOINT {name}"))?;
                self.exec(&format!("RELEASE SAVEPOINT {name}"))?;
            }
            None => self.db.connection().rollback()?,
        }
        tracing::debug!(depth = self.depth, "transaction rolled back");
        Ok(())
    }

    fn exec(&self, sql: &str) -> Result<()> {
        self.db.connection().exec(sql, &[])?;
        Ok(())
    }
}

impl Executor for Tx<'_> {
    fn connection(&self) -> &dyn Connection {
        self.db.connection()
    }
}

impl Drop for Tx<'_> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        tracing::warn!(depth = self.depth, "transaction dropped while open; rolling back");
        if let Err(err) = self.undo() {
            tracing::error!(error = %err, "rollback of dropped transaction failed");
        }
    }
}

/// Run `f` in `tx`, committing on `Ok` and rolling back on `Err` or panic.
pub(crate) fn run<T>(tx: Tx<'_>, f: impl FnOnce(&Tx<'_>) -> Result<T>) -> Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(|| f(&tx))) {
        Ok(Ok(value)) => {
            tx.commit()?;
            Ok(value)
        }
        Ok(Err(err)) => match tx.rollback() {
            Ok(()) => Err(err),
            Err(rollback) => Err(Error::Rollback {
                source: Box::new(err),
                rollback: Box::new(rollback),
            }),
        },
        Err(payload) => {
            if let Err(err) = tx.rollback() {
                tracing::error!(error = %err, "rollback after panic failed");
            }
            panic::resume_unwind(payload)
        }
    }
}
