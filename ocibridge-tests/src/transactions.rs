use crate::{MemoryNative, Script, silent_logs};
use ocibridge_core::{Attribute, Connection, DbError, Statement, Value, db_error};
use ocibridge_oci::CommitMode;

pub fn transactions<C: Connection>(connection: &C, native: &MemoryNative) {
    const INSERT: &str = "INSERT INTO ledger (amount) VALUES (:amount)";
    native.on(INSERT, Script::affected(1));
    let mode = || {
        native
            .last_executed()
            .expect("The insert was executed")
            .mode
    };

    assert!(!connection.in_transaction());
    connection
        .begin_transaction()
        .expect("Could not begin a transaction");
    assert!(connection.in_transaction());
    silent_logs! {
        let error = connection
            .begin_transaction()
            .expect_err("Transactions do not nest");
        assert!(matches!(db_error(&error), Some(DbError::Usage(..))));
    }

    // Commit
    let mut statement = connection
        .prepare(INSERT, Vec::new())
        .expect("Could not prepare the insert");
    statement
        .execute_with(&[("amount", Value::Int64(10))])
        .expect("Could not insert");
    assert_eq!(statement.row_count().expect("Could not count the rows"), 1);
    assert_eq!(mode(), CommitMode::NoAutoCommit);
    let commits = native.commits();
    connection.commit().expect("Could not commit");
    assert_eq!(native.commits(), commits + 1);
    assert!(!connection.in_transaction());
    silent_logs! {
        assert!(connection.commit().is_err());
        assert!(connection.rollback().is_err());
    }

    // Rollback
    connection
        .begin_transaction()
        .expect("Could not begin a transaction");
    statement
        .execute_with(&[("amount", Value::Int64(-10))])
        .expect("Could not insert");
    let rollbacks = native.rollbacks();
    connection.rollback().expect("Could not roll back");
    assert_eq!(native.rollbacks(), rollbacks + 1);
    assert!(!connection.in_transaction());

    // Autocommit outside of transactions
    assert!(connection.set_attribute(Attribute::Autocommit, true.into()));
    statement.execute().expect("Could not insert");
    assert_eq!(mode(), CommitMode::CommitOnSuccess);
    connection
        .begin_transaction()
        .expect("Could not begin a transaction");
    statement.execute().expect("Could not insert");
    assert_eq!(mode(), CommitMode::NoAutoCommit);
    connection.commit().expect("Could not commit");
    assert!(connection.set_attribute(Attribute::Autocommit, false.into()));
    statement.execute().expect("Could not insert");
    assert_eq!(mode(), CommitMode::NoAutoCommit);

    // Older clients
    native.set_no_auto_commit(false);
    statement.execute().expect("Could not insert");
    assert_eq!(mode(), CommitMode::Default);
    native.set_no_auto_commit(true);

    drop(statement);
    assert_eq!(connection.exec(INSERT).expect("Could not execute"), 1);
}
