//! Object-relational mapping over the `strata-sql` driver boundary.
//!
//! Provides a fluent API for building SQL queries against mapped entities,
//! automatic type conversions, cascading association writes and
//! transactions, on top of the ``SeaQuery`` statement builder.
//!
//! # Quick Start
//!
//! ## Define an Entity
//!
//! ```ignore
//! use chrono::{DateTime, Utc};
//!
//! entity! {
//!     table = "posts",
//!     #[derive(Debug, Clone, Default)]
//!     pub struct Post {
//!         pub id: String,
//!         pub title: String,
//!         pub published: bool,
//!         pub created_at: DateTime<Utc>,
//!     }
//! }
//! ```
//!
//! `id` becomes the primary key and `created_at` is stamped on create unless
//! the `descriptor` closure says otherwise:
//!
//! ```ignore
//! entity! {
//!     table = "user_logs",
//!     descriptor = |d| d.auto_increment("id").access("note", Access::ReadOnly),
//!     #[derive(Debug, Clone, Default)]
//!     pub struct UserLog {
//!         pub id: i64,
//!         pub note: String,
//!     }
//! }
//! ```
//!
//! ## CRUD Operations
//!
//! ```ignore
//! let db = Db::open(":memory:")?;
//!
//! let mut post = Post { id: "p1".into(), title: "Hello".into(), ..Post::default() };
//! db.create(&mut post)?;
//!
//! let posts = SelectBuilder::<Post>::new()
//!     .r#where(Filter::eq("published", true))
//!     .order("created_at desc")
//!     .limit(10)
//!     .find(&db)?;
//!
//! UpdateBuilder::<Post>::new()
//!     .set("published", true)
//!     .r#where(Filter::eq("id", "p1"))
//!     .exec(&db)?;
//!
//! db.delete(&post)?;
//! ```
//!
//! ## Filtering
//!
//! ```ignore
//! Filter::eq("status", "active")
//!     .and(Filter::gt("views", 1000))
//!     .or(Filter::raw("title LIKE ?", vec!["%rust%".into()]));
//!
//! // Table-qualified (for joins)
//! Filter::table_eq("posts", "published", true);
//! Filter::col_eq("posts", "author_id", "users", "id");
//! ```
//!
//! ## Upserts
//!
//! ```ignore
//! InsertBuilder::<User>::new()
//!     .set("email", "test@example.com")
//!     .set("name", "John Doe")
//!     .on_conflict("email")
//!     .do_update(&["name"])
//!     .exec(&db)?;
//! // INSERT INTO "users" ("email", "name") VALUES (?, ?)
//! //   ON CONFLICT ("email") DO UPDATE SET "name" = "excluded"."name"
//! ```
//!
//! ## Transactions
//!
//! ```ignore
//! db.transaction(|tx| {
//!     tx.create(&mut post)?;
//!     tx.transaction(|nested| nested.delete(&old))?;
//!     Ok(())
//! })?;
//! ```

mod association;
mod db;
mod delete;
mod descriptor;
mod entity;
mod error;
mod filter;
mod insert;
mod join;
mod mapper;
mod mutation;
mod query;
mod select;
mod transaction;
mod update;

pub use association::Related;
pub use db::{Db, Executor};
pub use delete::DeleteBuilder;
pub use descriptor::{
    Access, Column, Descriptor, DescriptorBuilder, Mode, Relation, RelationKind,
};
pub use entity::{Association, Embedded, Entity, FetchValue, FromRow, Record, RowView, is_zero};
pub use error::{Error, Result};
pub use filter::{Filter, Param};
pub use insert::InsertBuilder;
pub use join::{Join, JoinKind};
pub use mutation::{Conflict, WriteOptions};
pub use query::{Query, QueryBuilder};
pub use select::SelectBuilder;
// Driver types used in query parameters, rows and custom value conversions.
pub use strata_sql::{Connection, DataType, Dialect, Field, Row, Sqlite};
pub use transaction::Tx;
pub use update::UpdateBuilder;

// Re-exports for ``entity`` macro use only. This is needed to avoid leaking ``SeaQuery`` value
// types into user code
#[doc(hidden)]
pub mod __private {
    pub use anyhow;
    pub use sea_query::Value;
}
