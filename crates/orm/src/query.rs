use sea_query::backend::{
    EscapeBuilder, OperLeftAssocDecider, PrecedenceDecider, QuotedBuilder, TableRefBuilder,
};
use sea_query::prepare::SqlWriter;
use sea_query::{BinOper, Oper, Quote, SimpleExpr, SubQueryStatement, UnOper, Value, Values};

use crate::entity::values_to_datatypes;
use crate::error::{Error, Result};
use crate::{DataType, Dialect};

/// A rendered statement: SQL text plus positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub sql: String,
    pub params: Vec<DataType>,
}

impl Query {
    /// Convert the output of a sea-query `build` call and log it.
    pub(crate) fn from_parts(table: &str, builder: &str, parts: (String, Values)) -> Result<Self> {
        let (sql, values) = parts;
        let params = values_to_datatypes(values).map_err(|e| Error::Query(format!("{e:#}")))?;

        tracing::debug!(
            table,
            sql = %sql,
            param_count = params.len(),
            "{builder} generated SQL"
        );

        Ok(Self { sql, params })
    }
}

/// sea-query backend rendering double-quoted identifiers with the
/// placeholder style of a [`Dialect`].
pub struct QueryBuilder {
    pub quote: Quote,
    pub placeholder: &'static str, // "?" or "$"
    pub numbered: bool,            // false for "?", true for "$1, $2, ..."
}

impl QueryBuilder {
    #[must_use]
    pub fn for_dialect(dialect: Dialect) -> Self {
        let (placeholder, numbered) = match dialect {
            Dialect::Postgres => ("$", true),
            Dialect::Sqlite => ("?", false),
        };
        Self {
            quote: Quote::new(b'"'),
            placeholder,
            numbered,
        }
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::for_dialect(Dialect::default())
    }
}

impl QuotedBuilder for QueryBuilder {
    fn quote(&self) -> Quote {
        self.quote
    }
}

impl EscapeBuilder for QueryBuilder {}

impl TableRefBuilder for QueryBuilder {}

impl OperLeftAssocDecider for QueryBuilder {
    fn well_known_left_associative(&self, op: &BinOper) -> bool {
        // Same as sea-query 0.32.7 backend/query_builder.rs `common_well_known_left_associative`
        matches!(
            op,
            BinOper::And | BinOper::Or | BinOper::Add | BinOper::Sub | BinOper::Mul | BinOper::Mod
        )
    }
}

impl PrecedenceDecider for QueryBuilder {
    fn inner_expr_well_known_greater_precedence(
        &self, inner: &SimpleExpr, outer_oper: &Oper,
    ) -> bool {
        // Same as sea-query 0.32.7 backend/query_builder.rs
        // `common_inner_expr_well_known_greater_precedence`. Tuples carry their
        // own parentheses: wrapping them again turns `IN (?, ?)` into a row value.
        match inner {
            SimpleExpr::Column(_)
            | SimpleExpr::Tuple(_)
            | SimpleExpr::Constant(_)
            | SimpleExpr::FunctionCall(_)
            | SimpleExpr::Value(_)
            | SimpleExpr::Keyword(_)
            | SimpleExpr::Case(_)
            | SimpleExpr::SubQuery(_, _) => true,
            SimpleExpr::Binary(_, inner_oper, _) => {
                let outer = OperKind::of(outer_oper);
                match OperKind::of(&Oper::BinOper(*inner_oper)) {
                    OperKind::Arithmetic => matches!(
                        outer,
                        OperKind::Comparison | OperKind::Between | OperKind::Logical
                    ),
                    OperKind::Comparison | OperKind::Is => outer == OperKind::Logical,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

// Operator classes relevant to parenthesisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperKind {
    Logical,
    // arithmetic and shift operators
    Arithmetic,
    // comparison, IN and LIKE operators
    Comparison,
    Between,
    Is,
    Other,
}

impl OperKind {
    fn of(oper: &Oper) -> Self {
        match oper {
            Oper::UnOper(UnOper::Not) | Oper::BinOper(BinOper::And | BinOper::Or) => Self::Logical,
            Oper::BinOper(
                BinOper::Mul
                | BinOper::Div
                | BinOper::Mod
                | BinOper::Add
                | BinOper::Sub
                | BinOper::LShift
                | BinOper::RShift,
            ) => Self::Arithmetic,
            Oper::BinOper(
                BinOper::SmallerThan
                | BinOper::SmallerThanOrEqual
                | BinOper::Equal
                | BinOper::GreaterThanOrEqual
                | BinOper::GreaterThan
                | BinOper::NotEqual
                | BinOper::In
                | BinOper::NotIn
                | BinOper::Like
                | BinOper::NotLike,
            ) => Self::Comparison,
            Oper::BinOper(BinOper::Between | BinOper::NotBetween) => Self::Between,
            Oper::BinOper(BinOper::Is | BinOper::IsNot) => Self::Is,
            _ => Self::Other,
        }
    }
}

impl sea_query::backend::QueryBuilder for QueryBuilder {
    fn prepare_query_statement(&self, query: &SubQueryStatement, sql: &mut dyn SqlWriter) {
        match query {
            SubQueryStatement::SelectStatement(s) => self.prepare_select_statement(s, sql),
            SubQueryStatement::InsertStatement(s) => self.prepare_insert_statement(s, sql),
            SubQueryStatement::UpdateStatement(s) => self.prepare_update_statement(s, sql),
            SubQueryStatement::DeleteStatement(s) => self.prepare_delete_statement(s, sql),
            SubQueryStatement::WithStatement(s) => self.prepare_with_query(s, sql),
        }
    }

    fn prepare_value(&self, value: &Value, sql: &mut dyn SqlWriter) {
        sql.push_param(value.clone(), self);
    }

    fn placeholder(&self) -> (&str, bool) {
        (self.placeholder, self.numbered)
    }
}
