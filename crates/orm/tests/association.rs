//! Integration tests for association writes and loading.

#![allow(missing_docs)]

mod common;

use common::{Todo, User, Wallet, db, recorded_db, row_count};
use strata_orm::{Db, Executor, Filter, SelectBuilder, WriteOptions};

fn wallet(id: &str, balance: i64) -> Wallet {
    Wallet {
        id: id.to_string(),
        balance,
        ..Wallet::default()
    }
}

// u1 owns wallet w1 and todos t1, t2; u2 owns only todo t3
fn seed(db: &Db) {
    let mut first = User::new("u1", "jinzhu", 18);
    first.wallet = Some(wallet("w1", 100));
    first.todos = vec![Todo::new("t1", "write"), Todo::new("t2", "test")];
    db.create(&mut first).unwrap();

    let mut second = User::new("u2", "alice", 30);
    second.todos = vec![Todo::new("t3", "ship")];
    db.create(&mut second).unwrap();
}

fn todo_ids(user: &User) -> Vec<&str> {
    let mut ids: Vec<_> = user.todos.iter().map(|todo| todo.id.as_str()).collect();
    ids.sort_unstable();
    ids
}

#[test]
fn create_cascades_to_children() {
    let db = db();
    let mut user = User::new("u1", "jinzhu", 18);
    user.wallet = Some(wallet("w1", 100));
    user.todos = vec![Todo::new("t1", "write"), Todo::new("t2", "test")];

    db.create(&mut user).unwrap();

    // foreign keys are set on the caller's values too
    assert_eq!(user.wallet.as_ref().unwrap().user_id, "u1");
    assert!(user.todos.iter().all(|todo| todo.user_id == "u1"));

    let stored = SelectBuilder::<Wallet>::new().take(&db).unwrap();
    assert_eq!(stored.user_id, "u1");
    assert_eq!(stored.balance, 100);
    let todos = SelectBuilder::<Todo>::new().r#where(Filter::eq("user_id", "u1")).count(&db).unwrap();
    assert_eq!(todos, 2);
}

#[test]
fn create_can_omit_associations() {
    let db = db();
    let mut user = User::new("u1", "jinzhu", 18);
    user.wallet = Some(wallet("w1", 100));

    db.create_with(&mut user, WriteOptions::default().omit_associations()).unwrap();

    assert_eq!(row_count(&db, "users"), 1);
    assert_eq!(row_count(&db, "wallets"), 0);
}

#[test]
fn preload_issues_one_query_per_relation() {
    let (db, statements) = recorded_db();
    seed(&db);
    statements.clear();

    let users = SelectBuilder::<User>::new()
        .preload::<Wallet>()
        .preload::<Todo>()
        .order("id")
        .find(&db)
        .unwrap();

    assert_eq!(statements.take().len(), 3);

    assert_eq!(users[0].wallet.as_ref().map(|w| w.id.as_str()), Some("w1"));
    assert_eq!(todo_ids(&users[0]), vec!["t1", "t2"]);
    assert!(users[1].wallet.is_none());
    assert_eq!(todo_ids(&users[1]), vec!["t3"]);
}

#[test]
fn preload_skips_soft_deleted_children() {
    let db = db();
    seed(&db);
    db.delete(&Todo::new("t2", "")).unwrap();

    let user = SelectBuilder::<User>::new()
        .r#where(Filter::eq("id", "u1"))
        .preload::<Todo>()
        .take(&db)
        .unwrap();
    assert_eq!(todo_ids(&user), vec!["t1"]);
}

#[test]
fn preload_with_no_owners_runs_no_extra_query() {
    let (db, statements) = recorded_db();

    let users = SelectBuilder::<User>::new().preload::<Wallet>().find(&db).unwrap();
    assert!(users.is_empty());
    assert_eq!(statements.take().len(), 1);
}

#[test]
fn join_matches_preload() {
    let db = db();
    seed(&db);

    let joined =
        SelectBuilder::<User>::new().joins::<Wallet>().order("id").find(&db).unwrap();
    let preloaded =
        SelectBuilder::<User>::new().preload::<Wallet>().order("id").find(&db).unwrap();

    assert_eq!(joined.len(), 2);
    assert_eq!(joined[0].wallet, preloaded[0].wallet);
    assert_eq!(joined[0].wallet.as_ref().unwrap().balance, 100);
    assert!(joined[1].wallet.is_none());
    assert!(preloaded[1].wallet.is_none());
}

#[test]
fn join_filters_on_related_columns() {
    let db = db();
    seed(&db);

    let users = SelectBuilder::<User>::new()
        .joins::<Wallet>()
        .r#where(Filter::table_is_null("wallet", "id"))
        .find(&db)
        .unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, "u2");
}

#[test]
fn belongs_to_parent_is_created_first() {
    let db = db();
    let mut owned = wallet("w1", 5);
    owned.user = Some(Box::new(User::new("u5", "owner", 50)));

    db.create(&mut owned).unwrap();
    assert_eq!(owned.user_id, "u5");
    assert_eq!(row_count(&db, "users"), 1);

    // an existing parent is left untouched
    let mut second = wallet("w2", 7);
    second.user = Some(Box::new(User::new("u5", "renamed", 1)));
    db.create(&mut second).unwrap();
    let owner = SelectBuilder::<User>::new().take(&db).unwrap();
    assert_eq!(owner.name.first_name, "owner");

    let loaded = SelectBuilder::<Wallet>::new()
        .r#where(Filter::eq("id", "w1"))
        .preload::<User>()
        .take(&db)
        .unwrap();
    assert_eq!(loaded.user.map(|user| user.id), Some("u5".to_string()));

    let joined = SelectBuilder::<Wallet>::new().joins::<User>().order("id").find(&db).unwrap();
    assert!(joined.iter().all(|w| w.user.as_ref().is_some_and(|user| user.age == 50)));
}

#[test]
fn save_reassigns_existing_child() {
    let db = db();
    seed(&db);

    let moved = SelectBuilder::<Wallet>::new().take(&db).unwrap();
    let mut second = SelectBuilder::<User>::new().r#where(Filter::eq("id", "u2")).take(&db).unwrap();
    second.wallet = Some(moved);
    db.save(&mut second).unwrap();

    let stored = SelectBuilder::<Wallet>::new().take(&db).unwrap();
    assert_eq!(stored.user_id, "u2");
    assert_eq!(row_count(&db, "wallets"), 1);
}

#[test]
fn cascade_inside_transaction_rolls_back_together() {
    let db = db();

    db.create(&mut User::new("u2", "existing", 30)).unwrap();

    let err = db
        .transaction(|tx| {
            let mut user = User::new("u1", "jinzhu", 18);
            user.wallet = Some(wallet("w1", 100));
            user.todos = vec![Todo::new("t1", "a"), Todo::new("t2", "b")];
            tx.create(&mut user)?;
            tx.create(&mut User::new("u2", "duplicate", 1))
        })
        .unwrap_err();

    assert!(err.is_constraint());
    assert_eq!(row_count(&db, "users"), 1);
    assert_eq!(row_count(&db, "wallets"), 0);
    assert_eq!(row_count(&db, "todos"), 0);
}
