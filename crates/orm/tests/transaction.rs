//! Integration tests for transaction boundaries against in-memory `SQLite`.

#![allow(missing_docs)]

mod common;

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use common::{User, db, recorded_db, row_count};
use strata_orm::{Error, Executor, Filter, Result, SelectBuilder, UpdateBuilder};

#[test]
fn committed_writes_persist() {
    let db = db();

    let created = db
        .transaction(|tx| {
            tx.create(&mut User::new("u1", "jinzhu", 18))?;
            tx.create(&mut User::new("u2", "jinzhu 2", 21))?;
            // writes are visible inside the transaction
            SelectBuilder::<User>::new().count(tx)
        })
        .unwrap();

    assert_eq!(created, 2);
    assert_eq!(row_count(&db, "users"), 2);
}

#[test]
fn error_rolls_back_every_write() {
    let db = db();
    db.create(&mut User::new("u0", "existing", 40)).unwrap();

    let err = db
        .transaction(|tx| {
            tx.create(&mut User::new("u1", "jinzhu", 18))?;
            UpdateBuilder::<User>::new()
                .set("age", 41)
                .r#where(Filter::eq("id", "u0"))
                .exec(tx)?;
            // duplicate key
            tx.create(&mut User::new("u0", "again", 1))?;
            Ok(())
        })
        .unwrap_err();

    assert!(err.is_constraint());
    assert_eq!(row_count(&db, "users"), 1);
    let existing = SelectBuilder::<User>::new().take(&db).unwrap();
    assert_eq!(existing.age, 40);
}

#[test]
fn panic_rolls_back_and_propagates() {
    let db = db();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        db.transaction(|tx| -> Result<()> {
            tx.create(&mut User::new("u1", "jinzhu", 18))?;
            panic!("closure failed");
        })
    }));

    assert!(outcome.is_err());
    assert_eq!(row_count(&db, "users"), 0);

    // the connection is usable afterwards
    db.create(&mut User::new("u2", "after", 1)).unwrap();
    assert_eq!(row_count(&db, "users"), 1);
}

#[test]
fn manual_commit_and_rollback() {
    let (db, statements) = recorded_db();

    let tx = db.begin().unwrap();
    tx.create(&mut User::new("u1", "kept", 18)).unwrap();
    tx.commit().unwrap();

    let tx = db.begin().unwrap();
    tx.create(&mut User::new("u2", "discarded", 18)).unwrap();
    tx.rollback().unwrap();

    let ids: Vec<_> =
        SelectBuilder::<User>::new().find(&db).unwrap().into_iter().map(|u| u.id).collect();
    assert_eq!(ids, vec!["u1"]);

    let boundaries: Vec<_> = statements
        .take()
        .into_iter()
        .filter(|sql| matches!(sql.as_str(), "BEGIN" | "COMMIT" | "ROLLBACK"))
        .collect();
    assert_eq!(boundaries, vec!["BEGIN", "COMMIT", "BEGIN", "ROLLBACK"]);
}

#[test]
fn dropped_transaction_rolls_back() {
    let (db, statements) = recorded_db();

    {
        let tx = db.begin().unwrap();
        tx.create(&mut User::new("u1", "jinzhu", 18)).unwrap();
    }

    assert_eq!(row_count(&db, "users"), 0);
    assert!(statements.take().contains(&"ROLLBACK".to_string()));
}

#[test]
fn nested_failure_keeps_outer_writes() {
    let (db, statements) = recorded_db();

    db.transaction(|tx| {
        tx.create(&mut User::new("u1", "outer", 18))?;

        let inner = tx.transaction(|nested| {
            nested.create(&mut User::new("u2", "inner", 18))?;
            Err::<(), _>(Error::Query("inner failure".into()))
        });
        assert!(matches!(inner, Err(Error::Query(_))));

        tx.transaction(|nested| nested.create(&mut User::new("u3", "released", 18)))?;
        Ok(())
    })
    .unwrap();

    let ids: Vec<_> = SelectBuilder::<User>::new()
        .order("id")
        .find(&db)
        .unwrap()
        .into_iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(ids, vec!["u1", "u3"]);

    let savepoints: Vec<_> =
        statements.take().into_iter().filter(|sql| sql.contains("SAVEPOINT")).collect();
    assert_eq!(
        savepoints,
        vec![
            "SAVEPOINT strata_sp_1",
            "ROLLBACK TO SAVEPOINT strata_sp_1",
            "RELEASE SAVEPOINT strata_sp_1",
            "SAVEPOINT strata_sp_1",
            "RELEASE SAVEPOINT strata_sp_1",
        ]
    );
}

#[test]
fn savepoints_nest_by_depth() {
    let (db, statements) = recorded_db();

    db.transaction(|tx| {
        tx.transaction(|first| {
            first.transaction(|second| second.create(&mut User::new("u1", "deep", 18)))
        })
    })
    .unwrap();

    assert_eq!(row_count(&db, "users"), 1);
    let savepoints: Vec<_> =
        statements.take().into_iter().filter(|sql| sql.contains("SAVEPOINT")).collect();
    assert_eq!(savepoints[1], "SAVEPOINT strata_sp_2");
}

#[test]
fn failed_rollback_reports_both_errors() {
    let db = db();

    let err = db
        .transaction(|tx| {
            tx.create(&mut User::new("u1", "jinzhu", 18))?;
            db.close()?;
            Err::<(), _>(Error::Query("work failed".into()))
        })
        .unwrap_err();

    match err {
        Error::Rollback { source, rollback } => {
            assert!(matches!(*source, Error::Query(_)));
            assert!(matches!(*rollback, Error::Connection(_)));
        }
        other => panic!("expected rollback error, got {other}"),
    }
}

#[test]
fn row_locks_inside_transaction() {
    let db = db();
    db.create(&mut User::new("u1", "jinzhu", 18)).unwrap();

    db.transaction(|tx| {
        let mut user = SelectBuilder::<User>::new()
            .r#where(Filter::eq("id", "u1"))
            .lock_for_update()
            .take(tx)?;
        user.age += 1;
        tx.save(&mut user)
    })
    .unwrap();

    let user = SelectBuilder::<User>::new().take(&db).unwrap();
    assert_eq!(user.age, 19);
}

#[test]
fn other_threads_wait_for_open_transaction() {
    let db = db();
    let tx = db.begin().unwrap();
    tx.create(&mut User::new("u1", "discarded", 18)).unwrap();

    let (started, ready) = mpsc::channel();
    let writer = {
        let db = db.clone();
        thread::spawn(move || {
            started.send(()).unwrap();
            db.create(&mut User::new("u2", "kept", 30)).unwrap();
            // a second transaction waits instead of failing
            db.transaction(|tx| tx.create(&mut User::new("u3", "later", 40))).unwrap();
        })
    };

    ready.recv().unwrap();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(SelectBuilder::<User>::new().count(&tx).unwrap(), 1);
    tx.rollback().unwrap();
    writer.join().unwrap();

    let ids: Vec<_> = SelectBuilder::<User>::new()
        .order("id")
        .find(&db)
        .unwrap()
        .into_iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(ids, vec!["u2", "u3"]);
}

#[test]
fn owning_thread_can_use_handle_inside_transaction() {
    let db = db();

    db.transaction(|tx| {
        tx.create(&mut User::new("u1", "jinzhu", 18))?;
        // same thread: joins the transaction rather than waiting on it
        assert_eq!(row_count(&db, "users"), 1);
        Err::<(), _>(Error::Query("abort".into()))
    })
    .unwrap_err();

    assert_eq!(row_count(&db, "users"), 0);
}
