use crate::{MemoryNative, ResultSet, Script};
use ocibridge_core::{Attribute, AttributeValue, Connection, ParamType, Statement, Value};
use ocibridge_oci::NativeValue;

pub fn simple<C: Connection>(connection: &C, native: &MemoryNative) {
    const QUERY: &str = "SELECT id, name, notes FROM t WHERE id = :id";
    native.on(
        QUERY,
        Script::rows(
            ResultSet::new()
                .column("ID", "NUMBER")
                .column("NAME", "VARCHAR2")
                .column("NOTES", "CLOB")
                .row([
                    NativeValue::Integer(1),
                    NativeValue::Text("x".into()),
                    NativeValue::Text("long text".into()),
                ]),
        ),
    );

    let mut statement = connection
        .prepare(QUERY, Vec::new())
        .expect("Could not prepare the query");
    assert_eq!(statement.query_string(), QUERY);
    statement
        .bind_value("id", Value::Int64(1), ParamType::INT)
        .expect("Could not bind :id");
    statement.execute().expect("Could not execute the query");
    assert_eq!(statement.column_count().expect("Could not count the columns"), 3);

    let row = statement
        .fetch_next()
        .expect("Could not fetch the row")
        .expect("The query returns one row")
        .into_row()
        .expect("The default fetch style is associative");
    assert_eq!(row.labels.to_vec(), ["ID", "NAME", "NOTES"]);
    assert_eq!(row["ID"], Value::Int64(1));
    assert_eq!(row["NAME"], Value::Varchar("x".into()));
    assert_eq!(row.try_get::<i32>("ID").expect("ID is a number"), 1);
    assert!(row.try_get::<i32>("MISSING").is_err());
    assert!(row["NOTES"].is_stream());
    let notes = row["NOTES"]
        .as_stream()
        .expect("Large object columns are fetched as streams");
    assert_eq!(
        notes.contents_string().expect("Could not read NOTES"),
        "long text"
    );
    assert_eq!(row.into_values().len(), 3);
    assert!(
        statement
            .fetch_next()
            .expect("Fetching past the end is not an error")
            .is_none()
    );

    let executed = native.last_executed().expect("The query was executed");
    assert_eq!(executed.sql, QUERY);
    assert_eq!(
        executed.bind(":id").map(|v| &v.value),
        Some(&NativeValue::Text("1".into()))
    );

    let meta = statement.column_meta(2).expect("Could not describe NOTES");
    assert_eq!(meta.name, "NOTES");
    assert_eq!(meta.native_type, "CLOB");
    assert_eq!(meta.param_type, Some(ParamType::CLOB));
    assert!(meta.table.is_none());

    // Read only attributes
    let name = connection.get_attribute(Attribute::DriverName);
    assert_eq!(name, Some(AttributeValue::Text("oci".into())));
    assert!(!connection.set_attribute(Attribute::DriverName, "other".into()));
    assert_eq!(connection.get_attribute(Attribute::DriverName), name);
    assert!(!statement.set_attribute(Attribute::ServerVersion, "0".into()));
    assert!(statement.set_attribute(Attribute::Prefetch, AttributeValue::Int(10)));
}
