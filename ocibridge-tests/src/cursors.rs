use crate::{MemoryNative, ResultSet, Script, silent_logs};
use indoc::indoc;
use ocibridge_core::{
    Connection, DbError, FetchArgument, FetchStyle, Param, ParamType, Statement, Value, db_error,
};
use ocibridge_oci::NativeValue;

pub fn cursors<C: Connection>(connection: &C, native: &MemoryNative) {
    const BLOCK: &str = indoc! {"
        BEGIN
            OPEN :employees FOR SELECT id, name FROM employees WHERE dept = :dept;
        END;
    "};
    native.on(
        BLOCK,
        Script::default().cursor(
            ":employees",
            ResultSet::new()
                .column("ID", "NUMBER")
                .column("NAME", "VARCHAR2")
                .row([NativeValue::Integer(1), NativeValue::Text("Ada".into())])
                .row([NativeValue::Integer(2), NativeValue::Text("Linus".into())]),
        ),
    );

    // The statement continues as the cursor the block opened
    let mut statement = connection
        .prepare(BLOCK, Vec::new())
        .expect("Could not prepare the block");
    statement
        .bind_param(":employees", &Param::new(Value::Null), ParamType::CURSOR, None)
        .expect("Could not bind the cursor");
    statement
        .execute_with(&[(":dept", Value::Varchar("R&D".into()))])
        .expect("Could not run the block");
    assert_eq!(statement.column_count().expect("Could not count"), 2);
    let rows = statement
        .fetch_all(Some(FetchStyle::Assoc), FetchArgument::None)
        .expect("Could not fetch the employees");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("NAME"), Some(&Value::Varchar("Ada".into())));
    assert_eq!(rows[1].get("ID"), Some(&Value::Int64(2)));
    let executed = native.executed();
    let block = executed
        .iter()
        .rev()
        .find(|v| v.sql == BLOCK.trim())
        .expect("The block was executed");
    assert_eq!(
        block.bind(":dept").map(|v| &v.value),
        Some(&NativeValue::Text("R&D".into()))
    );

    // Cursors only come out of PL/SQL blocks
    let mut statement = connection
        .prepare("SELECT :employees FROM dual", Vec::new())
        .expect("Could not prepare the query");
    silent_logs! {
        let error = statement
            .bind_param(":employees", &Param::new(Value::Null), ParamType::CURSOR, None)
            .expect_err("A query cannot return a cursor parameter");
        assert!(matches!(db_error(&error), Some(DbError::Usage(..))));
    }

    // Unknown markers are ignored
    statement
        .bind_value(":missing", Value::Int64(1), ParamType::INT)
        .expect("Binding an absent marker is not an error");
}
