use chrono::{DateTime, NaiveDate, Utc};
use sea_query::{Expr, ExprTrait, SimpleExpr, Value};

use crate::entity::{Record, is_zero};
use crate::error::{Error, Result};
use crate::select::table_column;
use crate::Dialect;

/// Filter represents database predicates without exposing ``SeaQuery`` types to callers.
///
/// Values are stored internally as ``sea_query::Value`` but callers use natural
/// Rust types (i32, String, ``DateTime<Utc>``) which convert via From.
///
/// For filters with optional table parameter: None uses the statement's main
/// table, ``Some("name")`` uses the specified table or join alias.
#[derive(Debug, Clone)]
pub enum Filter {
    /// [table.]column = value
    Eq(Option<&'static str>, &'static str, Value),
    /// [table.]column != value
    Ne(Option<&'static str>, &'static str, Value),
    /// [table.]column > value
    Gt(Option<&'static str>, &'static str, Value),
    /// [table.]column >= value
    Gte(Option<&'static str>, &'static str, Value),
    /// [table.]column < value
    Lt(Option<&'static str>, &'static str, Value),
    /// [table.]column <= value
    Lte(Option<&'static str>, &'static str, Value),
    /// [table.]column IN (values)
    In(Option<&'static str>, &'static str, Vec<Value>),
    /// [table.]column NOT IN (values)
    NotIn(Option<&'static str>, &'static str, Vec<Value>),
    /// [table.]column IS NULL
    IsNull(Option<&'static str>, &'static str),
    /// [table.]column IS NOT NULL
    IsNotNull(Option<&'static str>, &'static str),
    /// [table.]column LIKE pattern
    Like(Option<&'static str>, &'static str, String),
    /// [table.]column NOT LIKE pattern
    NotLike(Option<&'static str>, &'static str, String),
    /// [table.]column BETWEEN low AND high
    Between(Option<&'static str>, &'static str, Value, Value),
    /// [table.]column NOT BETWEEN low AND high
    NotBetween(Option<&'static str>, &'static str, Value, Value),
    /// Column-to-column comparison: table1.col1 = table2.col2
    ColEq(&'static str, &'static str, &'static str, &'static str),
    /// Column-to-column comparison: table1.col1 != table2.col2
    ColNe(&'static str, &'static str, &'static str, &'static str),
    /// Column-to-column comparison: table1.col1 > table2.col2
    ColGt(&'static str, &'static str, &'static str, &'static str),
    /// Column-to-column comparison: table1.col1 < table2.col2
    ColLt(&'static str, &'static str, &'static str, &'static str),
    /// Raw SQL fragment with `?` positional parameters
    Raw(String, Vec<Param>),
    /// Logical AND of multiple filters
    And(Vec<Self>),
    /// Logical OR of multiple filters
    Or(Vec<Self>),
    /// Logical NOT of a filter
    Not(Box<Self>),
}

/// A positional parameter of a raw fragment.
#[derive(Debug, Clone)]
pub enum Param {
    /// Bound as a single placeholder.
    Value(Value),
    /// Expanded to a parenthesised placeholder list, `(?, ?, ...)`.
    List(Vec<Value>),
}

impl Param {
    /// A list parameter, for `column IN ?`.
    #[must_use]
    pub fn list(values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

macro_rules! param_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Param {
                fn from(value: $ty) -> Self {
                    Self::Value(value.into())
                }
            }
        )*
    };
}

param_from!(Value, bool, i32, i64, u32, u64, f64, &str, String, DateTime<Utc>, NaiveDate);

impl Filter {
    fn resolve_column(
        tbl: Option<&'static str>, col: &'static str, default_table: &str,
    ) -> SimpleExpr {
        Expr::col(table_column(tbl.unwrap_or(default_table), col)).into()
    }

    fn columns(tbl1: &str, col1: &str, tbl2: &str, col2: &str) -> (SimpleExpr, SimpleExpr) {
        (Expr::col(table_column(tbl1, col1)).into(), Expr::col(table_column(tbl2, col2)).into())
    }

    /// Convert Filter to ``SeaQuery`` ``SimpleExpr`` using the specified table name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Query`] if a raw fragment's placeholders do not match
    /// its parameters.
    pub fn into_expr(self, default_table: &str, dialect: Dialect) -> Result<SimpleExpr> {
        let expr = match self {
            Self::Eq(tbl, col, val) => Self::resolve_column(tbl, col, default_table).eq(val),
            Self::Ne(tbl, col, val) => Self::resolve_column(tbl, col, default_table).ne(val),
            Self::Gt(tbl, col, val) => Self::resolve_column(tbl, col, default_table).gt(val),
            Self::Gte(tbl, col, val) => Self::resolve_column(tbl, col, default_table).gte(val),
            Self::Lt(tbl, col, val) => Self::resolve_column(tbl, col, default_table).lt(val),
            Self::Lte(tbl, col, val) => Self::resolve_column(tbl, col, default_table).lte(val),
            Self::In(tbl, col, vals) => Self::resolve_column(tbl, col, default_table).is_in(vals),
            Self::NotIn(tbl, col, vals) => {
                Self::resolve_column(tbl, col, default_table).is_not_in(vals)
            }
            Self::IsNull(tbl, col) => Self::resolve_column(tbl, col, default_table).is_null(),
            Self::IsNotNull(tbl, col) => {
                Self::resolve_column(tbl, col, default_table).is_not_null()
            }
            Self::Like(tbl, col, pattern) => {
                Self::resolve_column(tbl, col, default_table).like(pattern)
            }
            Self::NotLike(tbl, col, pattern) => {
                Self::resolve_column(tbl, col, default_table).not_like(pattern)
            }
            Self::Between(tbl, col, low, high) => {
                Self::resolve_column(tbl, col, default_table).between(low, high)
            }
            Self::NotBetween(tbl, col, low, high) => {
                Self::resolve_column(tbl, col, default_table).not_between(low, high)
            }
            Self::ColEq(tbl1, col1, tbl2, col2) => {
                let (left, right) = Self::columns(tbl1, col1, tbl2, col2);
                left.eq(right)
            }
            Self::ColNe(tbl1, col1, tbl2, col2) => {
                let (left, right) = Self::columns(tbl1, col1, tbl2, col2);
                left.ne(right)
            }
            Self::ColGt(tbl1, col1, tbl2, col2) => {
                let (left, right) = Self::columns(tbl1, col1, tbl2, col2);
                left.gt(right)
            }
            Self::ColLt(tbl1, col1, tbl2, col2) => {
                let (left, right) = Self::columns(tbl1, col1, tbl2, col2);
                left.lt(right)
            }
            Self::Raw(sql, params) => raw_expr(&sql, params, dialect)?,
            Self::And(filters) => {
                let mut exprs = Vec::with_capacity(filters.len());
                for filter in filters {
                    exprs.push(filter.into_expr(default_table, dialect)?);
                }
                let mut exprs = exprs.into_iter();
                exprs.next().map_or_else(
                    || Expr::value(true), // no filters, so all conditions satisfied, hence `true`
                    |first| exprs.fold(first, SimpleExpr::and),
                )
            }
            Self::Or(filters) => {
                let mut exprs = Vec::with_capacity(filters.len());
                for filter in filters {
                    exprs.push(filter.into_expr(default_table, dialect)?);
                }
                let mut exprs = exprs.into_iter();
                exprs.next().map_or_else(
                    || Expr::value(false), // no filters, so 0 conditions satisfied, hence `false`
                    |first| exprs.fold(first, SimpleExpr::or),
                )
            }
            Self::Not(filter) => Expr::expr(filter.into_expr(default_table, dialect)?).not(),
        };
        Ok(expr)
    }

    /// Combine with `other` under AND, flattening nested ANDs.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::And(mut filters) => {
                filters.push(other);
                Self::And(filters)
            }
            filter => Self::And(vec![filter, other]),
        }
    }

    /// Combine with `other` under OR, flattening nested ORs.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match self {
            Self::Or(mut filters) => {
                filters.push(other);
                Self::Or(filters)
            }
            filter => Self::Or(vec![filter, other]),
        }
    }

    /// Negate `filter`.
    #[must_use]
    pub fn not(filter: Self) -> Self {
        Self::Not(Box::new(filter))
    }

    /// A raw SQL fragment. Each `?` outside a quoted string or quoted
    /// identifier consumes one parameter; [`Param::List`] parameters expand
    /// to `(?, ?, ...)`. Comments are not recognised: a `?` inside `--` or
    /// `/* */` still counts as a placeholder.
    ///
    /// ```ignore
    /// Filter::raw("name = ? AND age >= ?", ["jinzhu".into(), 18.into()]);
    /// Filter::raw("name IN ?", [Param::list(["jinzhu", "jinzhu 2"])]);
    /// ```
    #[must_use]
    pub fn raw(sql: impl Into<String>, params: impl IntoIterator<Item = Param>) -> Self {
        Self::Raw(sql.into(), params.into_iter().collect())
    }

    /// One equality per non-zero readable column of `record`.
    ///
    /// Zero values (`""`, `0`, `false`) cannot be expressed this way; use
    /// [`Filter::from_map`] for them.
    #[must_use]
    pub fn from_entity(record: &dyn Record) -> Self {
        let descriptor = record.descriptor();
        let filters = record
            .values()
            .into_iter()
            .filter(|(name, value)| {
                descriptor.column(name).is_some_and(|column| column.access.readable())
                    && !is_zero(value)
            })
            .map(|(name, value)| Self::Eq(None, name, value))
            .collect();
        Self::And(filters)
    }

    /// One equality per entry, zero values included.
    #[must_use]
    pub fn from_map<V: Into<Value>>(entries: impl IntoIterator<Item = (&'static str, V)>) -> Self {
        Self::And(entries.into_iter().map(|(name, value)| Self::Eq(None, name, value.into())).collect())
    }

    // Convenience constructors for common single-table queries

    /// Creates an equality filter (column = value).
    #[must_use]
    pub fn eq(col: &'static str, val: impl Into<Value>) -> Self {
        Self::Eq(None, col, val.into())
    }

    /// Creates an inequality filter (column != value).
    #[must_use]
    pub fn ne(col: &'static str, val: impl Into<Value>) -> Self {
        Self::Ne(None, col, val.into())
    }

    /// Creates a greater-than filter (column > value).
    #[must_use]
    pub fn gt(col: &'static str, val: impl Into<Value>) -> Self {
        Self::Gt(None, col, val.into())
    }

    /// Creates a greater-than-or-equal filter (column >= value).
    #[must_use]
    pub fn gte(col: &'static str, val: impl Into<Value>) -> Self {
        Self::Gte(None, col, val.into())
    }

    /// Creates a less-than filter (column < value).
    #[must_use]
    pub fn lt(col: &'static str, val: impl Into<Value>) -> Self {
        Self::Lt(None, col, val.into())
    }

    /// Creates a less-than-or-equal filter (column <= value).
    #[must_use]
    pub fn lte(col: &'static str, val: impl Into<Value>) -> Self {
        Self::Lte(None, col, val.into())
    }

    /// Creates an IN filter (column IN (values)).
    #[must_use]
    pub fn r#in(col: &'static str, vals: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::In(None, col, vals.into_iter().map(Into::into).collect())
    }

    /// Creates a NOT IN filter (column NOT IN (values)).
    #[must_use]
    pub fn not_in(col: &'static str, vals: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::NotIn(None, col, vals.into_iter().map(Into::into).collect())
    }

    /// Creates an IS NULL filter.
    #[must_use]
    pub const fn is_null(col: &'static str) -> Self {
        Self::IsNull(None, col)
    }

    /// Creates an IS NOT NULL filter.
    #[must_use]
    pub const fn is_not_null(col: &'static str) -> Self {
        Self::IsNotNull(None, col)
    }

    /// Creates a LIKE filter with pattern matching.
    #[must_use]
    pub fn like(col: &'static str, pattern: impl Into<String>) -> Self {
        Self::Like(None, col, pattern.into())
    }

    /// Creates a NOT LIKE filter with pattern matching.
    #[must_use]
    pub fn not_like(col: &'static str, pattern: impl Into<String>) -> Self {
        Self::NotLike(None, col, pattern.into())
    }

    /// Creates a BETWEEN filter (column BETWEEN low AND high).
    #[must_use]
    pub fn between(col: &'static str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::Between(None, col, low.into(), high.into())
    }

    /// Creates a NOT BETWEEN filter.
    #[must_use]
    pub fn not_between(col: &'static str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::NotBetween(None, col, low.into(), high.into())
    }

    // Table-qualified variants for joined queries

    /// Creates a table-qualified equality filter (table.column = value).
    #[must_use]
    pub fn table_eq(table: &'static str, col: &'static str, val: impl Into<Value>) -> Self {
        Self::Eq(Some(table), col, val.into())
    }

    /// Creates a table-qualified IS NULL filter (table.column IS NULL).
    #[must_use]
    pub const fn table_is_null(table: &'static str, col: &'static str) -> Self {
        Self::IsNull(Some(table), col)
    }

    /// Creates a table-qualified IS NOT NULL filter (table.column IS NOT NULL).
    #[must_use]
    pub const fn table_is_not_null(table: &'static str, col: &'static str) -> Self {
        Self::IsNotNull(Some(table), col)
    }

    /// Compare two columns for equality.
    /// Table names are required since we're comparing columns from different tables.
    #[must_use]
    pub const fn col_eq(
        table1: &'static str, col1: &'static str, table2: &'static str, col2: &'static str,
    ) -> Self {
        Self::ColEq(table1, col1, table2, col2)
    }

    /// Creates a column-to-column inequality filter (table1.col1 != table2.col2).
    #[must_use]
    pub const fn col_ne(
        table1: &'static str, col1: &'static str, table2: &'static str, col2: &'static str,
    ) -> Self {
        Self::ColNe(table1, col1, table2, col2)
    }

    /// Creates a column-to-column greater-than filter (table1.col1 > table2.col2).
    #[must_use]
    pub const fn col_gt(
        table1: &'static str, col1: &'static str, table2: &'static str, col2: &'static str,
    ) -> Self {
        Self::ColGt(table1, col1, table2, col2)
    }

    /// Creates a column-to-column less-than filter (table1.col1 < table2.col2).
    #[must_use]
    pub const fn col_lt(
        table1: &'static str, col1: &'static str, table2: &'static str, col2: &'static str,
    ) -> Self {
        Self::ColLt(table1, col1, table2, col2)
    }
}

// Rewrites `?` into the dialect's placeholder, expanding list parameters, and
// hands the fragment to sea-query which numbers the placeholders.
fn raw_expr(sql: &str, params: Vec<Param>, dialect: Dialect) -> Result<SimpleExpr> {
    let mark = match dialect {
        Dialect::Postgres => '$',
        Dialect::Sqlite => '?',
    };

    let mut rendered = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut params = params.into_iter();
    let mut placeholders = 0;
    let mut consumed = 0;
    // the quote character of the literal or identifier being copied
    let mut quote: Option<char> = None;

    for ch in sql.chars() {
        match ch {
            '\'' | '"' if quote.is_none_or(|open| open == ch) => {
                quote = if quote.is_some() { None } else { Some(ch) };
                rendered.push(ch);
            }
            '?' if quote.is_none() => {
                placeholders += 1;
                if let Some(param) = params.next() {
                    consumed += 1;
                    match param {
                        Param::Value(value) => {
                            rendered.push(mark);
                            values.push(value);
                        }
                        Param::List(list) => {
                            let marks = vec![mark.to_string(); list.len()];
                            rendered.push_str(&format!("({})", marks.join(", ")));
                            values.extend(list);
                        }
                    }
                }
            }
            _ => rendered.push(ch),
        }
    }

    let supplied = consumed + params.count();
    if supplied != placeholders {
        return Err(Error::Query(format!(
            "raw fragment \"{sql}\" has {placeholders} placeholder(s) but {supplied} parameter(s)"
        )));
    }

    Ok(Expr::cust_with_values(rendered, values))
}
