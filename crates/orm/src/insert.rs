use std::marker::PhantomData;

use sea_query::{Alias, OnConflict, SimpleExpr, Value};

use crate::Dialect;
use crate::db::Executor;
use crate::descriptor::Mode;
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::query::{Query, QueryBuilder};

/// Builder for constructing INSERT queries.
pub struct InsertBuilder<M: Entity> {
    insert: Insert,
    _marker: PhantomData<M>,
}

impl<M: Entity> Default for InsertBuilder<M> {
    fn default() -> Self {
        Self {
            insert: Insert::new(M::TABLE),
            _marker: PhantomData,
        }
    }
}

impl<M: Entity> InsertBuilder<M> {
    /// Creates a new INSERT query builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the create-writable columns from an entity instance.
    #[must_use]
    pub fn from_entity(entity: &M) -> Self {
        let descriptor = M::schema();
        let mut builder = Self::new();
        for (column, value) in entity.values() {
            if descriptor.column(column).is_some_and(|c| c.access.writable(Mode::Create)) {
                builder = builder.set(column, value);
            }
        }
        builder
    }

    /// Sets a column value for the insert.
    #[must_use]
    pub fn set<V>(mut self, column: &'static str, value: V) -> Self
    where
        V: Into<Value>,
    {
        self.insert.set(column, value.into());
        self
    }

    /// Handle conflicts on specified columns. Call ``do_update()`` or ``do_nothing()`` after.
    #[must_use]
    pub fn on_conflict_columns(mut self, columns: &[&'static str]) -> Self {
        self.insert.conflict = Some(ConflictStrategy::DoNothing {
            target: columns.to_vec(),
        });
        self
    }

    /// Shorthand for single column conflict
    #[must_use]
    pub fn on_conflict(self, column: &'static str) -> Self {
        self.on_conflict_columns(&[column])
    }

    /// On conflict, do nothing (ignore the insert)
    #[must_use]
    pub fn do_nothing(mut self) -> Self {
        let target = self.insert.take_target();
        self.insert.conflict = Some(ConflictStrategy::DoNothing { target });
        self
    }

    /// On conflict, update the specified columns with excluded (new) values
    #[must_use]
    pub fn do_update(mut self, columns: &[&'static str]) -> Self {
        self.insert.do_update(columns.to_vec());
        self
    }

    /// On conflict, update all columns except the conflict target
    #[must_use]
    pub fn do_update_all(mut self) -> Self {
        let target = self.insert.take_target();
        let columns =
            self.insert.columns.iter().copied().filter(|col| !target.contains(col)).collect();
        self.insert.conflict = Some(ConflictStrategy::DoUpdate { target, columns });
        self
    }

    /// Specifies columns to return from inserted rows.
    #[must_use]
    pub fn returning(mut self, column: &'static str) -> Self {
        self.insert.returning.push(column);
        self
    }

    /// Build the INSERT query for the default dialect.
    ///
    /// # Errors
    ///
    /// Returns an error if any query values cannot be converted to SQL data types.
    pub fn build(self) -> Result<Query> {
        self.build_for(Dialect::default())
    }

    /// Build the INSERT query for `dialect`.
    ///
    /// # Errors
    ///
    /// Returns an error if any query values cannot be converted to SQL data types.
    pub fn build_for(self, dialect: Dialect) -> Result<Query> {
        self.insert.build(dialect)
    }

    /// Execute the insert, returning the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Constraint`] on a key violation without a conflict
    /// clause, or any error raised by the connection.
    pub fn exec(self, db: &dyn Executor) -> Result<u64> {
        let query = self.build_for(db.dialect())?;
        db.execute(&query)
    }
}

#[derive(Debug, Clone)]
enum ConflictStrategy {
    DoNothing { target: Vec<&'static str> },
    DoUpdate { target: Vec<&'static str>, columns: Vec<&'static str> },
}

/// Table-level insert of one or more rows sharing one column list.
#[derive(Debug, Clone)]
pub(crate) struct Insert {
    table: &'static str,
    columns: Vec<&'static str>,
    rows: Vec<Vec<Value>>,
    conflict: Option<ConflictStrategy>,
    returning: Vec<&'static str>,
}

impl Insert {
    pub(crate) const fn new(table: &'static str) -> Self {
        Self {
            table,
            columns: Vec::new(),
            rows: Vec::new(),
            conflict: None,
            returning: Vec::new(),
        }
    }

    // single-row column setter used by `InsertBuilder`
    fn set(&mut self, column: &'static str, value: Value) {
        if self.rows.is_empty() {
            self.rows.push(Vec::new());
        }
        self.columns.push(column);
        self.rows[0].push(value);
    }

    /// Append a row. Every row must carry the same columns in the same order.
    pub(crate) fn row(&mut self, values: Vec<(&'static str, Value)>) -> Result<()> {
        let (columns, row): (Vec<_>, Vec<_>) = values.into_iter().unzip();
        if self.rows.is_empty() {
            self.columns = columns;
        } else if self.columns != columns {
            return Err(Error::Query(format!(
                "{}: batch rows must share one column list; expected {:?}, got {:?}",
                self.table, self.columns, columns
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub(crate) fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub(crate) fn on_conflict_do_nothing(&mut self, target: Vec<&'static str>) {
        self.conflict = Some(ConflictStrategy::DoNothing { target });
    }

    pub(crate) fn on_conflict_update(
        &mut self, target: Vec<&'static str>, columns: Vec<&'static str>,
    ) {
        self.conflict = Some(ConflictStrategy::DoUpdate { target, columns });
    }

    pub(crate) fn returning(&mut self, columns: &[&'static str]) {
        self.returning.extend_from_slice(columns);
    }

    fn take_target(&mut self) -> Vec<&'static str> {
        match self.conflict.take() {
            Some(ConflictStrategy::DoNothing { target } | ConflictStrategy::DoUpdate { target, .. }) => {
                target
            }
            None => Vec::new(),
        }
    }

    fn do_update(&mut self, columns: Vec<&'static str>) {
        let target = self.take_target();
        self.conflict = Some(ConflictStrategy::DoUpdate { target, columns });
    }

    pub(crate) fn build(self, dialect: Dialect) -> Result<Query> {
        if self.rows.is_empty() {
            return Err(Error::Query(format!("{}: insert without values", self.table)));
        }

        let mut statement = sea_query::Query::insert();
        statement.into_table(Alias::new(self.table));
        statement.columns(self.columns.iter().map(|column| Alias::new(*column)));

        for row in self.rows {
            let row: Vec<SimpleExpr> = row.into_iter().map(SimpleExpr::Value).collect();
            statement.values(row).map_err(|e| Error::Query(format!("{}: {e}", self.table)))?;
        }

        if let Some(conflict) = self.conflict {
            let on_conflict = match conflict {
                // an update with nothing to set degrades to ignoring the row
                ConflictStrategy::DoUpdate { target, columns } if !columns.is_empty() => {
                    OnConflict::columns(target.into_iter().map(Alias::new))
                        .update_columns(columns.into_iter().map(Alias::new))
                        .to_owned()
                }
                ConflictStrategy::DoNothing { target } | ConflictStrategy::DoUpdate { target, .. } => {
                    if target.is_empty() {
                        OnConflict::new().do_nothing().to_owned()
                    } else {
                        OnConflict::columns(target.into_iter().map(Alias::new))
                            .do_nothing()
                            .to_owned()
                    }
                }
            };
            statement.on_conflict(on_conflict);
        }

        for column in self.returning {
            statement.returning_col(Alias::new(column));
        }

        Query::from_parts(self.table, "InsertBuilder", statement.build(QueryBuilder::for_dialect(dialect)))
    }
}
