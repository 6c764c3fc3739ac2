use std::marker::PhantomData;

use chrono::Utc;
use sea_query::{Alias, Value};

use crate::Dialect;
use crate::db::Executor;
use crate::descriptor::Mode;
use crate::entity::{Entity, is_zero};
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::query::{Query, QueryBuilder};

/// Builder for constructing UPDATE queries.
///
/// The update-time columns of `M` are stamped unless set explicitly, and
/// soft-deleted rows are left alone unless [`UpdateBuilder::unscoped`] is
/// called.
pub struct UpdateBuilder<M: Entity> {
    set_clauses: Vec<(&'static str, Value)>,
    filter: Option<Filter>,
    returning: Vec<&'static str>,
    unscoped: bool,
    _marker: PhantomData<M>,
}

impl<M: Entity> Default for UpdateBuilder<M> {
    fn default() -> Self {
        Self {
            set_clauses: Vec::new(),
            filter: None,
            returning: Vec::new(),
            unscoped: false,
            _marker: PhantomData,
        }
    }
}

impl<M: Entity> UpdateBuilder<M> {
    /// Creates a new UPDATE query builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a column to a new value.
    #[must_use]
    pub fn set<V>(mut self, column: &'static str, value: V) -> Self
    where
        V: Into<Value>,
    {
        self.set_clauses.push((column, value.into()));
        self
    }

    /// Sets every entry verbatim, zero values (`""`, `0`) included.
    #[must_use]
    pub fn set_map<V: Into<Value>>(
        mut self, entries: impl IntoIterator<Item = (&'static str, V)>,
    ) -> Self {
        self.set_clauses.extend(entries.into_iter().map(|(column, value)| (column, value.into())));
        self
    }

    /// Sets the non-zero, update-writable, non-key columns of `entity`.
    #[must_use]
    pub fn set_entity(mut self, entity: &M) -> Self {
        let descriptor = M::schema();
        for (column, value) in entity.values() {
            let writable = descriptor.column(column).is_some_and(|c| {
                c.access.writable(Mode::Update)
                    && !c.primary_key
                    && !(c.auto_create_time && !c.auto_update_time)
            });
            if writable && !is_zero(&value) {
                self.set_clauses.push((column, value));
            }
        }
        self
    }

    /// Adds a WHERE clause filter.
    #[must_use]
    pub fn r#where(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        self
    }

    /// Include soft-deleted rows.
    #[must_use]
    pub const fn unscoped(mut self) -> Self {
        self.unscoped = true;
        self
    }

    /// Specifies columns to return from updated rows.
    #[must_use]
    pub fn returning(mut self, column: &'static str) -> Self {
        self.returning.push(column);
        self
    }

    /// Build the UPDATE query for the default dialect.
    ///
    /// # Errors
    ///
    /// Returns an error if there is nothing to set or query values cannot be
    /// converted to SQL data types.
    pub fn build(self) -> Result<Query> {
        self.build_for(Dialect::default())
    }

    /// Build the UPDATE query for `dialect`.
    ///
    /// # Errors
    ///
    /// Returns an error if there is nothing to set or query values cannot be
    /// converted to SQL data types.
    pub fn build_for(mut self, dialect: Dialect) -> Result<Query> {
        let descriptor = M::schema();
        if self.set_clauses.is_empty() {
            return Err(Error::Query(format!("{}: update without columns", M::TABLE)));
        }

        let now = Utc::now();
        for column in descriptor.columns.iter().filter(|c| c.auto_update_time) {
            if !self.set_clauses.iter().any(|(name, _)| *name == column.name) {
                self.set_clauses.push((column.name, Value::from(now)));
            }
        }

        let mut statement = sea_query::Query::update();
        statement.table(Alias::new(M::TABLE));

        for (column, value) in self.set_clauses {
            statement.value(Alias::new(column), value);
        }

        let scope = descriptor.soft_delete.filter(|_| !self.unscoped).map(Filter::is_null);
        let filter = match (self.filter, scope) {
            (Some(filter), Some(scope)) => Some(filter.and(scope)),
            (filter, scope) => filter.or(scope),
        };
        if let Some(filter) = filter {
            statement.and_where(filter.into_expr(M::TABLE, dialect)?);
        }

        for column in self.returning {
            statement.returning_col(Alias::new(column));
        }

        Query::from_parts(M::TABLE, "UpdateBuilder", statement.build(QueryBuilder::for_dialect(dialect)))
    }

    /// Execute the update, returning the number of rows affected.
    ///
    /// # Errors
    ///
    /// Returns any error raised while building or executing the statement.
    pub fn exec(self, db: &dyn Executor) -> Result<u64> {
        let query = self.build_for(db.dialect())?;
        db.execute(&query)
    }
}
