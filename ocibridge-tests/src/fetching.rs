use crate::{MemoryNative, ResultSet, Script, silent_logs};
use ocibridge_core::{
    Attribute, AttributeValue, ColumnCase, Connection, DbError, FetchArg, FetchArgument,
    FetchStyle, FetchedRow, OracleNulls, Orientation, Statement, Value, db_error,
};
use ocibridge_oci::NativeValue;

const QUERY: &str = "SELECT code, label FROM colors ORDER BY code";

fn colors() -> ResultSet {
    ResultSet::new()
        .column("Code", "NUMBER")
        .column("Label", "VARCHAR2")
        .row([NativeValue::Integer(1), NativeValue::Text("red".into())])
        .row([NativeValue::Integer(2), NativeValue::Text("green".into())])
        .row([NativeValue::Integer(3), NativeValue::Null])
}

pub fn fetching<C: Connection>(connection: &C, native: &MemoryNative) {
    native.on(QUERY, Script::rows(colors()));

    // One row per style
    let mut statement = connection.query(QUERY).expect("Could not query the colors");
    let row = statement
        .fetch(Some(FetchStyle::Num), Orientation::Next, 0)
        .expect("Could not fetch")
        .expect("Expected the first color");
    assert_eq!(row.at(0), Some(&Value::Int64(1)));
    assert_eq!(row.at(1), Some(&Value::Varchar("red".into())));
    assert_eq!(row.get("LABEL"), None);
    let row = statement
        .fetch(Some(FetchStyle::Both), Orientation::Next, 0)
        .expect("Could not fetch")
        .expect("Expected the second color");
    assert_eq!(row.at(0), Some(&Value::Int64(2)));
    assert_eq!(row.get("LABEL"), Some(&Value::Varchar("green".into())));
    match statement.fetch(Some(FetchStyle::Obj), Orientation::Next, 0) {
        Ok(Some(FetchedRow::Object(record))) => {
            assert_eq!(record.get("CODE"), Some(&Value::Int64(3)));
            assert_eq!(record.get("LABEL"), Some(&Value::Null));
        }
        other => panic!("Expected an object, found {:?}", other),
    }
    assert!(statement.fetch_next().expect("Could not fetch").is_none());

    // Only forward fetching
    let mut statement = connection.query(QUERY).expect("Could not query the colors");
    silent_logs! {
        let error = statement
            .fetch(None, Orientation::Prior, 0)
            .expect_err("Only the next orientation is allowed");
        assert!(matches!(db_error(&error), Some(DbError::Usage(..))));
        let error = statement
            .fetch(None, Orientation::Next, 2)
            .expect_err("Only the 0 offset is allowed");
        assert!(matches!(db_error(&error), Some(DbError::Usage(..))));
    }

    // Default fetch mode
    statement
        .set_fetch_mode(vec![FetchArg::Style(FetchStyle::Column), FetchArg::Column(1)])
        .expect("Could not set the fetch mode");
    assert_eq!(
        statement.get_attribute(Attribute::DefaultFetchMode),
        Some(AttributeValue::FetchStyle(FetchStyle::Column))
    );
    let value = statement
        .fetch_next()
        .expect("Could not fetch")
        .and_then(FetchedRow::into_value);
    assert_eq!(value, Some(Value::Varchar("red".into())));
    silent_logs! {
        let error = statement
            .set_fetch_mode(vec![
                FetchArg::Style(FetchStyle::Column),
                FetchArg::Column(1),
                FetchArg::Column(2),
            ])
            .expect_err("The third argument must be the constructor arguments");
        assert!(matches!(db_error(&error), Some(DbError::Usage(..))));
        let error = statement
            .set_fetch_mode(vec![FetchArg::Style(FetchStyle::KeyPair)])
            .expect_err("Key pair fetching is not implemented");
        assert!(matches!(db_error(&error), Some(DbError::NotImplemented(..))));
    }

    // Bulk fetching
    let mut statement = connection.query(QUERY).expect("Could not query the colors");
    let labels = statement
        .fetch_all(Some(FetchStyle::Column), FetchArgument::Column(1))
        .expect("Could not fetch the labels")
        .into_iter()
        .filter_map(FetchedRow::into_value)
        .collect::<Vec<_>>();
    assert_eq!(
        labels,
        [
            Value::Varchar("red".into()),
            Value::Varchar("green".into()),
            Value::Null
        ]
    );
    let mut statement = connection.query(QUERY).expect("Could not query the colors");
    let mut describe = |values: Vec<Value>| {
        Value::Varchar(
            values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(":"),
        )
    };
    let described = statement
        .fetch_all(Some(FetchStyle::Func), FetchArgument::Func(&mut describe))
        .expect("Could not fetch through the function")
        .into_iter()
        .filter_map(FetchedRow::into_value)
        .collect::<Vec<_>>();
    assert_eq!(
        described,
        [
            Value::Varchar("1:red".into()),
            Value::Varchar("2:green".into()),
            Value::Varchar("3:NULL".into())
        ]
    );
    let mut statement = connection.query(QUERY).expect("Could not query the colors");
    silent_logs! {
        let error = statement
            .fetch_all(Some(FetchStyle::Func), FetchArgument::None)
            .expect_err("The function style needs a function");
        assert!(matches!(db_error(&error), Some(DbError::Usage(..))));
    }
    let rows = statement
        .fetch_all(None, FetchArgument::None)
        .expect("Could not fetch the colors");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].get("CODE"), Some(&Value::Int64(3)));
    silent_logs! {
        assert!(
            statement.execute().is_err(),
            "The bulk fetch closes the cursor"
        );
    }

    // Label case and null conversion
    let mut statement = connection
        .prepare(
            QUERY,
            vec![
                (Attribute::Case, ColumnCase::Natural.into()),
                (Attribute::OracleNulls, OracleNulls::ToString.into()),
            ],
        )
        .expect("Could not prepare the colors");
    statement.execute().expect("Could not query the colors");
    let rows = statement
        .fetch_all(Some(FetchStyle::Assoc), FetchArgument::None)
        .expect("Could not fetch the colors");
    assert_eq!(rows[0].get("Label"), Some(&Value::Varchar("red".into())));
    assert_eq!(rows[2].get("Label"), Some(&Value::Varchar("".into())));
}
