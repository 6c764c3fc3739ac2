use std::marker::PhantomData;

use sea_query::{Alias, ColumnRef, IntoIden, LockType, Order, SimpleExpr};

use crate::association::{self, Related};
use crate::db::Executor;
use crate::descriptor::Descriptor;
use crate::entity::{Entity, FromRow, RowView};
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::join::Join;
use crate::query::{Query, QueryBuilder};
use crate::{Dialect, Row};

type Preload<M> = fn(&dyn Executor, &mut [M]) -> Result<()>;
type Attach<M> = fn(&mut M, &Row) -> Result<()>;

/// A relation fetched through a join and decoded from prefixed columns.
struct JoinedRelation<M> {
    name: &'static str,
    target: fn() -> &'static Descriptor,
    attach: Attach<M>,
}

/// Builder for constructing SELECT queries.
pub struct SelectBuilder<M: Entity> {
    columns: Option<Vec<&'static str>>,
    filter: Option<Filter>,
    limit: Option<u64>,
    offset: Option<u64>,
    order: Vec<(Option<String>, String, Order)>,
    joins: Vec<Join>,
    joined: Vec<JoinedRelation<M>>,
    preloads: Vec<Preload<M>>,
    lock: Option<LockType>,
    unscoped: bool,
    _marker: PhantomData<M>,
}

impl<M: Entity> Default for SelectBuilder<M> {
    fn default() -> Self {
        Self {
            columns: None,
            filter: None,
            limit: None,
            offset: None,
            order: Vec::new(),
            joins: Vec::new(),
            joined: Vec::new(),
            preloads: Vec::new(),
            lock: None,
            unscoped: false,
            _marker: PhantomData,
        }
    }
}

impl<M: Entity> SelectBuilder<M> {
    /// Creates a new SELECT query builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the projection. Fields whose column is not selected decode to
    /// their default value.
    #[must_use]
    pub fn select(mut self, columns: &[&'static str]) -> Self {
        self.columns = Some(columns.to_vec());
        self
    }

    /// Adds a WHERE clause filter, ANDed with the existing conditions.
    #[must_use]
    pub fn r#where(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        self
    }

    /// ORs `filter` with everything accumulated so far.
    #[must_use]
    pub fn or(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => Filter::Or(vec![existing, filter]),
            None => filter,
        });
        self
    }

    /// ANDs the negation of `filter`.
    #[must_use]
    pub fn not(self, filter: Filter) -> Self {
        self.r#where(Filter::not(filter))
    }

    /// Sets the maximum number of rows to return.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of rows to skip.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Adds ORDER BY terms from a spec such as `"age desc, name"`.
    /// Terms default to ascending; `table.column` qualifies explicitly.
    #[must_use]
    pub fn order(mut self, spec: &str) -> Self {
        for term in spec.split(',') {
            let mut parts = term.split_whitespace();
            let Some(column) = parts.next() else {
                continue;
            };
            let order = match parts.next() {
                Some(dir) if dir.eq_ignore_ascii_case("desc") => Order::Desc,
                _ => Order::Asc,
            };
            let (table, column) = match column.split_once('.') {
                Some((table, column)) => (Some(table.to_string()), column.to_string()),
                None => (None, column.to_string()),
            };
            self.order.push((table, column, order));
        }
        self
    }

    /// Adds ascending ORDER BY clause.
    #[must_use]
    pub fn order_by(mut self, table: Option<&'static str>, column: &'static str) -> Self {
        self.order.push((table.map(str::to_string), column.to_string(), Order::Asc));
        self
    }

    /// Adds descending ORDER BY clause.
    #[must_use]
    pub fn order_by_desc(mut self, table: Option<&'static str>, column: &'static str) -> Self {
        self.order.push((table.map(str::to_string), column.to_string(), Order::Desc));
        self
    }

    /// Include soft-deleted rows.
    #[must_use]
    pub const fn unscoped(mut self) -> Self {
        self.unscoped = true;
        self
    }

    /// Adds a JOIN clause to the query.
    #[must_use]
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Fetch the `R` relation in the same statement through a LEFT JOIN.
    ///
    /// Suited to belongs-to and has-one relations; a has-many join repeats
    /// the owner once per related row.
    #[must_use]
    pub fn joins<R: Entity>(mut self) -> Self
    where
        M: Related<R>,
    {
        self.joined.push(JoinedRelation {
            name: <M as Related<R>>::RELATION,
            target: R::schema,
            attach: association::attach_joined::<M, R>,
        });
        self
    }

    /// Fetch the `R` relation with one extra statement after the main query.
    #[must_use]
    pub fn preload<R: Entity + Clone>(mut self) -> Self
    where
        M: Related<R>,
    {
        self.preloads.push(association::preload::<M, R>);
        self
    }

    /// Lock the selected rows for update (`FOR UPDATE`), on dialects with
    /// row locks. Only meaningful inside a transaction.
    #[must_use]
    pub const fn lock_for_update(mut self) -> Self {
        self.lock = Some(LockType::Update);
        self
    }

    /// Lock the selected rows in share mode (`FOR SHARE`).
    #[must_use]
    pub const fn lock_for_share(mut self) -> Self {
        self.lock = Some(LockType::Share);
        self
    }

    /// Build the SELECT query for the default dialect.
    ///
    /// # Errors
    ///
    /// Returns an error if a relation is unknown, a raw fragment is malformed,
    /// or query values cannot be converted to SQL data types.
    pub fn build(&self) -> Result<Query> {
        self.build_for(Dialect::default())
    }

    /// Build the SELECT query for `dialect`.
    ///
    /// # Errors
    ///
    /// Returns an error if a relation is unknown, a raw fragment is malformed,
    /// or query values cannot be converted to SQL data types.
    pub fn build_for(&self, dialect: Dialect) -> Result<Query> {
        let descriptor = M::schema();
        let table = M::TABLE;
        let mut statement = sea_query::Query::select();

        match &self.columns {
            Some(columns) => {
                for column in columns {
                    statement.column(table_column(table, column));
                }
            }
            None => {
                for column in descriptor.readable() {
                    statement.column(table_column(table, column));
                }
            }
        }

        statement.from(Alias::new(table));

        let mut joins = Vec::with_capacity(self.joined.len() + self.joins.len());
        for joined in &self.joined {
            let relation = descriptor.relation(joined.name).ok_or_else(|| {
                Error::Query(format!("{table}: unknown relation '{}'", joined.name))
            })?;
            let target = (joined.target)();
            let prefix = relation.join_prefix();
            for column in target.readable() {
                statement.expr_as(
                    SimpleExpr::Column(table_column(relation.name, column)),
                    Alias::new(format!("{prefix}{column}")),
                );
            }
            joins.push(Join::relation(table, relation, target.soft_delete));
        }
        joins.extend(self.joins.iter().cloned());

        for join in joins {
            let spec = join.into_join_spec(table, dialect)?;
            let table_alias = Alias::new(spec.table);
            if let Some(alias) = spec.alias {
                statement.join_as(spec.kind, table_alias, Alias::new(alias), spec.on);
            } else {
                statement.join(spec.kind, table_alias, spec.on);
            }
        }

        let scope = descriptor
            .soft_delete
            .filter(|_| !self.unscoped)
            .map(|marker| Filter::table_is_null(table, marker));
        let filter = match (self.filter.clone(), scope) {
            (Some(filter), Some(scope)) => Some(filter.and(scope)),
            (filter, scope) => filter.or(scope),
        };
        if let Some(filter) = filter {
            statement.and_where(filter.into_expr(table, dialect)?);
        }

        for (order_table, column, order) in &self.order {
            let order_table = order_table.as_deref().unwrap_or(table);
            statement.order_by(table_column(order_table, column), order.clone());
        }

        if let Some(limit) = self.limit {
            statement.limit(limit);
        }

        if let Some(offset) = self.offset {
            statement.offset(offset);
        }

        if let Some(lock) = self.lock.clone()
            && dialect.supports_row_locks()
        {
            statement.lock(lock);
        }

        Query::from_parts(table, "SelectBuilder", statement.build(QueryBuilder::for_dialect(dialect)))
    }

    /// Every matching row; an empty result is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails or a row cannot be decoded.
    pub fn find(&self, db: &dyn Executor) -> Result<Vec<M>> {
        let query = self.build_for(db.dialect())?;
        let rows = db.fetch(&query)?;
        let partial = self.columns.is_some();

        let mut entities = Vec::with_capacity(rows.len());
        for row in &rows {
            let view = RowView::new(row).partial(partial);
            let mut entity = M::from_row(&view).map_err(|e| Error::mapping(M::TABLE, &e))?;
            for joined in &self.joined {
                (joined.attach)(&mut entity, row)?;
            }
            entities.push(entity);
        }

        for preload in &self.preloads {
            preload(db, &mut entities)?;
        }
        Ok(entities)
    }

    /// Every matching row decoded into `T`, which need not be an entity.
    /// Fields of `T` without a selected column take their default value.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails or a row cannot be decoded.
    pub fn find_as<T: FromRow>(&self, db: &dyn Executor) -> Result<Vec<T>> {
        let query = self.build_for(db.dialect())?;
        db.fetch(&query)?
            .iter()
            .map(|row| {
                T::from_row(&RowView::new(row).partial(true))
                    .map_err(|e| Error::mapping(M::TABLE, &e))
            })
            .collect()
    }

    /// First row ordered by primary key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no row matches.
    pub fn first(self, db: &dyn Executor) -> Result<M> {
        let ordered = M::schema().primary_key().into_iter().fold(self, |builder, column| {
            builder.order_by(None, column)
        });
        ordered.take(db)
    }

    /// Last row ordered by primary key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no row matches.
    pub fn last(self, db: &dyn Executor) -> Result<M> {
        let ordered = M::schema().primary_key().into_iter().fold(self, |builder, column| {
            builder.order_by_desc(None, column)
        });
        ordered.take(db)
    }

    /// One matching row in no particular order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no row matches.
    pub fn take(self, db: &dyn Executor) -> Result<M> {
        self.limit(1)
            .find(db)?
            .into_iter()
            .next()
            .ok_or(Error::NotFound { table: M::TABLE })
    }

    /// Number of matching rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub fn count(&self, db: &dyn Executor) -> Result<u64> {
        let query = self.build_for(db.dialect())?;
        let sql = format!("SELECT COUNT(*) AS \"count\" FROM ({}) AS \"counted\"", query.sql);
        let rows = db.fetch(&Query {
            sql,
            params: query.params,
        })?;
        let row = rows.first().ok_or(Error::NotFound { table: M::TABLE })?;
        let view = RowView::new(row);
        view.get::<u64>("count").map_err(|e| Error::mapping(M::TABLE, &e))
    }
}

pub fn table_column(table: &str, column: &str) -> ColumnRef {
    ColumnRef::TableColumn(Alias::new(table).into_iden(), Alias::new(column).into_iden())
}
