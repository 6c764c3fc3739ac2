use std::marker::PhantomData;

use chrono::Utc;
use sea_query::{Alias, Value};

use crate::Dialect;
use crate::db::Executor;
use crate::entity::{Entity, is_zero};
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::query::{Query, QueryBuilder};

/// Builder for constructing DELETE queries.
///
/// When `M` declares a soft-delete marker the statement is an UPDATE setting
/// the marker to the current time on rows that are not yet deleted.
/// [`DeleteBuilder::unscoped`] forces a physical DELETE.
pub struct DeleteBuilder<M: Entity> {
    filter: Option<Filter>,
    returning: Vec<&'static str>,
    unscoped: bool,
    _marker: PhantomData<M>,
}

impl<M: Entity> Default for DeleteBuilder<M> {
    fn default() -> Self {
        Self {
            filter: None,
            returning: Vec::new(),
            unscoped: false,
            _marker: PhantomData,
        }
    }
}

impl<M: Entity> DeleteBuilder<M> {
    /// Creates a new DELETE query builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
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

    /// Delete physically, soft-delete marker or not.
    #[must_use]
    pub const fn unscoped(mut self) -> Self {
        self.unscoped = true;
        self
    }

    /// Specifies columns to return from deleted rows.
    #[must_use]
    pub fn returning(mut self, column: &'static str) -> Self {
        self.returning.push(column);
        self
    }

    /// Build the DELETE query for the default dialect.
    ///
    /// # Errors
    ///
    /// Returns an error if any query values cannot be converted to SQL data types.
    pub fn build(self) -> Result<Query> {
        self.build_for(Dialect::default())
    }

    /// Build the DELETE (or soft-delete UPDATE) query for `dialect`.
    ///
    /// # Errors
    ///
    /// Returns an error if any query values cannot be converted to SQL data types.
    pub fn build_for(self, dialect: Dialect) -> Result<Query> {
        let marker = M::schema().soft_delete.filter(|_| !self.unscoped);
        let builder = QueryBuilder::for_dialect(dialect);

        let Some(marker) = marker else {
            let mut statement = sea_query::Query::delete();
            statement.from_table(Alias::new(M::TABLE));
            if let Some(filter) = self.filter {
                statement.and_where(filter.into_expr(M::TABLE, dialect)?);
            }
            for column in self.returning {
                statement.returning_col(Alias::new(column));
            }
            return Query::from_parts(M::TABLE, "DeleteBuilder", statement.build(builder));
        };

        let mut statement = sea_query::Query::update();
        statement.table(Alias::new(M::TABLE));
        statement.value(Alias::new(marker), Value::from(Utc::now()));

        let scope = Filter::is_null(marker);
        let filter = self.filter.map_or(scope.clone(), |filter| filter.and(scope));
        statement.and_where(filter.into_expr(M::TABLE, dialect)?);

        for column in self.returning {
            statement.returning_col(Alias::new(column));
        }
        Query::from_parts(M::TABLE, "DeleteBuilder", statement.build(builder))
    }

    /// Execute the delete, returning the number of rows affected.
    ///
    /// # Errors
    ///
    /// Returns any error raised while building or executing the statement.
    pub fn exec(self, db: &dyn Executor) -> Result<u64> {
        let query = self.build_for(db.dialect())?;
        db.execute(&query)
    }
}

/// Delete `entity` by primary key.
///
/// Every key column is matched, zero-valued parts of a composite key
/// included, so exactly one row is addressed. An entity whose key is
/// entirely zero has no row to address.
pub(crate) fn delete_entity<M: Entity>(db: &dyn Executor, entity: &M) -> Result<u64> {
    let values = entity.values();
    let mut filters = Vec::new();
    let mut keyed = false;

    for column in M::schema().primary_key() {
        let Some((_, value)) = values.iter().find(|(name, _)| *name == column) else {
            return Err(Error::Query(format!("{}: key column '{column}' is not mapped", M::TABLE)));
        };
        keyed |= !is_zero(value);
        filters.push(Filter::eq(column, value.clone()));
    }

    if !keyed {
        return Err(Error::Query(format!("{}: delete requires a primary key value", M::TABLE)));
    }
    DeleteBuilder::<M>::new().r#where(Filter::And(filters)).exec(db)
}
