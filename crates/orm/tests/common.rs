//! Common test helpers shared across integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use strata_orm::{
    Association, Connection, DataType, Db, Descriptor, Dialect, Embedded, Entity, Executor,
    FetchValue, FromRow, Record, Related, Relation, Row, RowView, Sqlite, embedded, entity,
};

// Common test entities used across multiple test files

embedded! {
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct Name {
        pub first_name: String,
        pub last_name: String,
    }
}

/// A user owning one wallet and any number of todos. Declared by hand since
/// it carries an embedded struct and association fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: String,
    pub name: Name,
    pub age: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub wallet: Option<Wallet>,
    pub todos: Vec<Todo>,
}

impl User {
    pub fn new(id: &str, first_name: &str, age: i64) -> Self {
        Self {
            id: id.to_string(),
            name: Name {
                first_name: first_name.to_string(),
                last_name: "smith".to_string(),
            },
            age,
            active: true,
            ..Self::default()
        }
    }
}

impl FromRow for User {
    fn from_row(row: &RowView<'_>) -> anyhow::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: <Name as Embedded>::from_row(row)?,
            age: row.get("age")?,
            active: row.get("active")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            wallet: None,
            todos: Vec::new(),
        })
    }
}

impl Record for User {
    fn descriptor(&self) -> &'static Descriptor {
        Self::schema()
    }

    fn values(&self) -> Vec<(&'static str, sea_query::Value)> {
        let mut values = vec![("id", self.id.clone().into())];
        values.extend(self.name.values());
        values.extend([
            ("age", self.age.into()),
            ("active", self.active.into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]);
        values
    }

    fn assign(&mut self, column: &str, value: &DataType) -> anyhow::Result<()> {
        match column {
            "id" => self.id = FetchValue::decode(value)?,
            "age" => self.age = FetchValue::decode(value)?,
            "active" => self.active = FetchValue::decode(value)?,
            "created_at" => self.created_at = FetchValue::decode(value)?,
            "updated_at" => self.updated_at = FetchValue::decode(value)?,
            _ => {
                if !self.name.assign(column, value)? {
                    anyhow::bail!("unknown column '{column}'");
                }
            }
        }
        Ok(())
    }

    fn associations(&mut self) -> Vec<Association<'_>> {
        vec![
            Association::of("wallet", self.wallet.iter_mut()),
            Association::of("todos", self.todos.iter_mut()),
        ]
    }
}

impl Entity for User {
    const TABLE: &'static str = "users";

    fn schema() -> &'static Descriptor {
        static SCHEMA: std::sync::LazyLock<Descriptor> = std::sync::LazyLock::new(|| {
            Descriptor::builder("users")
                .column("id")
                .embed::<Name>("name")
                .columns(&["age", "active", "created_at", "updated_at"])
                .relation(Relation::has_one("wallet", "wallets"))
                .relation(Relation::has_many("todos", "todos"))
                .build()
        });
        &SCHEMA
    }
}

impl Related<Wallet> for User {
    const RELATION: &'static str = "wallet";

    fn attach(&mut self, related: Vec<Wallet>) {
        self.wallet = related.into_iter().next();
    }
}

impl Related<Todo> for User {
    const RELATION: &'static str = "todos";

    fn attach(&mut self, related: Vec<Todo>) {
        self.todos = related;
    }
}

/// A wallet belonging to a user. The back reference is a value copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wallet {
    pub id: String,
    pub user_id: String,
    pub balance: i64,
    pub user: Option<Box<User>>,
}

impl FromRow for Wallet {
    fn from_row(row: &RowView<'_>) -> anyhow::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            balance: row.get("balance")?,
            user: None,
        })
    }
}

impl Record for Wallet {
    fn descriptor(&self) -> &'static Descriptor {
        Self::schema()
    }

    fn values(&self) -> Vec<(&'static str, sea_query::Value)> {
        vec![
            ("id", self.id.clone().into()),
            ("user_id", self.user_id.clone().into()),
            ("balance", self.balance.into()),
        ]
    }

    fn assign(&mut self, column: &str, value: &DataType) -> anyhow::Result<()> {
        match column {
            "id" => self.id = FetchValue::decode(value)?,
            "user_id" => self.user_id = FetchValue::decode(value)?,
            "balance" => self.balance = FetchValue::decode(value)?,
            _ => anyhow::bail!("unknown column '{column}'"),
        }
        Ok(())
    }

    fn associations(&mut self) -> Vec<Association<'_>> {
        vec![Association::of("user", self.user.iter_mut().map(|user| &mut **user))]
    }
}

impl Entity for Wallet {
    const TABLE: &'static str = "wallets";

    fn schema() -> &'static Descriptor {
        static SCHEMA: std::sync::LazyLock<Descriptor> = std::sync::LazyLock::new(|| {
            Descriptor::builder("wallets")
                .columns(&["id", "user_id", "balance"])
                .relation(Relation::belongs_to("user", "users"))
                .build()
        });
        &SCHEMA
    }
}

impl Related<User> for Wallet {
    const RELATION: &'static str = "user";

    fn attach(&mut self, related: Vec<User>) {
        self.user = related.into_iter().next().map(Box::new);
    }
}

entity! {
    table = "todos",
    descriptor = |d| d.soft_delete("deleted_at"),
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Todo {
        pub id: String,
        pub user_id: String,
        pub title: String,
        pub done: bool,
        pub deleted_at: Option<DateTime<Utc>>,
    }
}

impl Todo {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            ..Self::default()
        }
    }
}

entity! {
    table = "user_logs",
    descriptor = |d| d.auto_increment("id"),
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct UserLog {
        pub id: i64,
        pub user_id: String,
        pub action: String,
    }
}

/// A projection that is not an entity.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct UserSummary {
    pub id: String,
    pub first_name: String,
    pub age: i64,
}

impl FromRow for UserSummary {
    fn from_row(row: &RowView<'_>) -> anyhow::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            first_name: row.get("first_name")?,
            age: row.get("age")?,
        })
    }
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE users (
        id TEXT PRIMARY KEY,
        first_name TEXT NOT NULL DEFAULT '',
        last_name TEXT NOT NULL DEFAULT '',
        age INTEGER NOT NULL DEFAULT 0,
        active INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE wallets (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users (id),
        balance INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE todos (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL DEFAULT '',
        title TEXT NOT NULL DEFAULT '',
        done INTEGER NOT NULL DEFAULT 0,
        deleted_at TEXT
    )",
    "CREATE TABLE user_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        action TEXT NOT NULL
    )",
];

/// Route library logs to the test harness (`RUST_LOG=strata_orm=debug`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A fresh in-memory database with the fixture schema.
pub fn db() -> Db {
    init_tracing();
    let db = Db::open(":memory:").expect("open in-memory database");
    migrate(&db);
    db
}

/// A fresh in-memory database whose statements are recorded.
pub fn recorded_db() -> (Db, Statements) {
    init_tracing();
    let statements = Statements::default();
    let conn = Recording {
        inner: Sqlite::open(":memory:").expect("open in-memory database"),
        statements: statements.clone(),
    };
    let db = Db::new(conn);
    migrate(&db);
    statements.clear();
    (db, statements)
}

fn migrate(db: &Db) {
    for ddl in SCHEMA {
        db.exec_raw(ddl, &[]).expect("create fixture table");
    }
}

/// Count of rows in `table`, soft-deleted ones included.
pub fn row_count(db: &Db, table: &str) -> i64 {
    let rows = db.raw(&format!("SELECT COUNT(*) AS n FROM {table}"), &[]).expect("count rows");
    RowView::new(&rows[0]).get::<i64>("n").expect("decode count")
}

/// SQL text of every statement sent to a [`Recording`] connection.
#[derive(Debug, Clone, Default)]
pub struct Statements(Arc<Mutex<Vec<String>>>);

impl Statements {
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    fn push(&self, sql: &str) {
        self.0.lock().unwrap().push(sql.to_string());
    }
}

/// Connection wrapper recording every statement before delegating to `SQLite`.
#[derive(Debug)]
pub struct Recording {
    inner: Sqlite,
    statements: Statements,
}

impl Connection for Recording {
    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    fn query(&self, sql: &str, params: &[DataType]) -> strata_sql::Result<Vec<Row>> {
        self.statements.push(sql);
        self.inner.query(sql, params)
    }

    fn exec(&self, sql: &str, params: &[DataType]) -> strata_sql::Result<u64> {
        self.statements.push(sql);
        self.inner.exec(sql, params)
    }

    fn begin(&self) -> strata_sql::Result<()> {
        self.statements.push("BEGIN");
        self.inner.begin()
    }

    fn commit(&self) -> strata_sql::Result<()> {
        self.statements.push("COMMIT");
        self.inner.commit()
    }

    fn rollback(&self) -> strata_sql::Result<()> {
        self.statements.push("ROLLBACK");
        self.inner.rollback()
    }

    fn close(&self) -> strata_sql::Result<()> {
        self.inner.close()
    }
}

/// Normalize SQL by collapsing whitespace.
fn normalize_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonicalize SQL for comparison by removing identifier quotes and
/// parentheses and normalizing whitespace. Preserves string literals.
fn canonicalize_sql(sql: &str) -> String {
    let mut cleaned = String::with_capacity(sql.len());
    let mut in_single_quote = false;

    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_single_quote = !in_single_quote;
                cleaned.push(ch);
            }
            '"' | '(' | ')' if !in_single_quote => {}
            _ => cleaned.push(ch),
        }
    }

    normalize_sql(&cleaned)
}

/// Assert that SQL contains all expected fragments in order.
///
/// Identifier quotes and parentheses are stripped from both sides, so
/// fragments are written as `users.id = $1`.
#[allow(clippy::missing_panics_doc)]
pub fn assert_sql_contains(actual: &str, fragments: &[&str]) {
    let actual_canonical = canonicalize_sql(actual);
    let mut search_start = 0usize;

    for fragment in fragments {
        let fragment_canonical = canonicalize_sql(fragment);
        if fragment_canonical.is_empty() {
            continue;
        }

        if let Some(pos) = actual_canonical[search_start..].find(&fragment_canonical) {
            search_start += pos + fragment_canonical.len();
        } else {
            panic!(
                "expected SQL fragment `{fragment_canonical}` not found in `{actual_canonical}`"
            );
        }
    }
}

/// Assert that SQL contains none of `fragments`.
pub fn assert_sql_lacks(actual: &str, fragments: &[&str]) {
    let actual_canonical = canonicalize_sql(actual);
    for fragment in fragments {
        let fragment_canonical = canonicalize_sql(fragment);
        assert!(
            !actual_canonical.contains(&fragment_canonical),
            "unexpected SQL fragment `{fragment_canonical}` in `{actual_canonical}`"
        );
    }
}
