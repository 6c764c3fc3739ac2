use sea_query::{JoinType, SimpleExpr};

use crate::Dialect;
use crate::descriptor::Relation;
use crate::error::Result;
use crate::filter::Filter;

/// An ad-hoc SQL join, expressed with [`Filter`] conditions.
#[derive(Debug, Clone)]
pub struct Join {
    table: &'static str,
    alias: Option<&'static str>,
    on: Filter,
    kind: JoinKind,
}

/// Join types supported by the ORM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl Join {
    /// Creates an INNER JOIN.
    #[must_use]
    pub const fn inner(table: &'static str, on: Filter) -> Self {
        Self {
            table,
            alias: None,
            on,
            kind: JoinKind::Inner,
        }
    }

    /// Creates a LEFT JOIN.
    #[must_use]
    pub const fn left(table: &'static str, on: Filter) -> Self {
        Self {
            table,
            alias: None,
            on,
            kind: JoinKind::Left,
        }
    }

    /// Creates a RIGHT JOIN.
    #[must_use]
    pub const fn right(table: &'static str, on: Filter) -> Self {
        Self {
            table,
            alias: None,
            on,
            kind: JoinKind::Right,
        }
    }

    /// Sets an alias for the joined table.
    #[must_use]
    pub const fn alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    /// LEFT JOIN of `relation`'s table from `owner`, aliased by relation
    /// name. Soft-deleted related rows are excluded in the ON clause so the
    /// owner still appears with an absent relation.
    pub(crate) fn relation(
        owner: &'static str, relation: &Relation, soft_delete: Option<&'static str>,
    ) -> Self {
        let on = Filter::col_eq(relation.name, relation.target_key(), owner, relation.owner_key());
        let on = match soft_delete {
            Some(marker) => on.and(Filter::table_is_null(relation.name, marker)),
            None => on,
        };
        Self::left(relation.table, on).alias(relation.name)
    }

    /// Converts this Join into a ``JoinSpec`` for ``SeaQuery``.
    /// The ``default_table`` is the primary table being selected from.
    pub(crate) fn into_join_spec(self, default_table: &str, dialect: Dialect) -> Result<JoinSpec> {
        Ok(JoinSpec {
            table: self.table,
            alias: self.alias,
            on: self.on.into_expr(default_table, dialect)?,
            kind: self.kind.into_join_type(),
        })
    }
}

impl JoinKind {
    const fn into_join_type(self) -> JoinType {
        match self {
            Self::Inner => JoinType::InnerJoin,
            Self::Left => JoinType::LeftJoin,
            Self::Right => JoinType::RightJoin,
        }
    }
}

/// Internal representation used by ``SeaQuery``.
#[derive(Clone)]
pub struct JoinSpec {
    pub table: &'static str,
    pub alias: Option<&'static str>,
    pub on: SimpleExpr,
    pub kind: JoinType,
}
