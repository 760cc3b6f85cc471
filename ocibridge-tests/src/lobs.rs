use crate::{MemoryNative, Output, ResultSet, Script};
use indoc::indoc;
use ocibridge_core::{
    ColumnRef, Connection, FetchArgument, FetchStyle, FetchedRow, Param, ParamType, Statement,
    Stream, Value,
};
use ocibridge_oci::{NativeType, NativeValue};

pub fn lobs<C: Connection>(connection: &C, native: &MemoryNative) {
    const INSERT: &str = "INSERT INTO documents (id, body, image) VALUES (:id, :body, :image)";
    native.on(INSERT, Script::affected(1));
    let text = "Lorem ipsum dolor sit amet. ".repeat(600);
    let image = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    // Input large objects, one of them fed by a stream longer than a chunk
    let mut statement = connection
        .prepare(INSERT, Vec::new())
        .expect("Could not prepare the insert");
    let body = Param::new(Stream::from_text(text.clone()));
    statement
        .bind_value(":id", Value::Int64(7), ParamType::INT)
        .expect("Could not bind :id");
    statement
        .bind_param(":body", &body, ParamType::CLOB, None)
        .expect("Could not bind :body");
    statement
        .bind_value(":image", Value::Blob(image.clone().into()), ParamType::LOB)
        .expect("Could not bind :image");
    let freed = native.freed_lobs();
    statement.execute().expect("Could not insert the document");
    let executed = native.last_executed().expect("The insert was executed");
    let bound = executed.bind(":body").expect("The body was bound");
    assert_eq!(bound.native_type, NativeType::CLOB);
    assert_eq!(bound.max_length, -1);
    assert_eq!(bound.value, NativeValue::Raw(text.clone().into_bytes()));
    let bound = executed.bind(":image").expect("The image was bound");
    assert_eq!(bound.native_type, NativeType::BLOB);
    assert_eq!(bound.value, NativeValue::Raw(image.clone()));
    assert_eq!(
        native.freed_lobs(),
        freed + 2,
        "Input large objects are released by the execution"
    );
    drop(statement);

    // Output large object
    const BLOCK: &str = indoc! {"
        BEGIN
            :summary := summarize(:id);
        END;
    "};
    native.on(
        BLOCK,
        Script::default().output(":summary", Output::Value(NativeValue::Text("Lorem".into()))),
    );
    let mut statement = connection
        .prepare(BLOCK, Vec::new())
        .expect("Could not prepare the block");
    let summary = Param::new(Value::Null);
    statement
        .bind_param(":summary", &summary, ParamType::CLOB.input_output(), None)
        .expect("Could not bind :summary");
    statement
        .bind_value(":id", Value::Int64(7), ParamType::INT)
        .expect("Could not bind :id");
    let freed = native.freed_lobs();
    statement.execute().expect("Could not run the block");
    let stream = summary
        .get()
        .as_stream()
        .cloned()
        .expect("Output large objects become streams");
    assert_eq!(native.freed_lobs(), freed);
    assert_eq!(stream.contents_string().expect("Could not read"), "Lorem");
    drop(statement);
    assert_eq!(
        native.freed_lobs(),
        freed + 1,
        "Output large objects live as long as the statement"
    );

    // Large object columns bound to variables
    const SELECT: &str = "SELECT id, body, image FROM documents WHERE id = 7";
    native.on(
        SELECT,
        Script::rows(
            ResultSet::new()
                .column("ID", "NUMBER")
                .column("BODY", "CLOB")
                .column("IMAGE", "BLOB")
                .row([
                    NativeValue::Integer(7),
                    NativeValue::Text(text.clone()),
                    NativeValue::Raw(image.clone()),
                ]),
        ),
    );
    let mut statement = connection
        .prepare(SELECT, Vec::new())
        .expect("Could not prepare the query");
    statement.execute().expect("Could not query the document");
    let (id, body, picture) = (
        Param::new(Value::Null),
        Param::new(Value::Null),
        Param::new(Value::Null),
    );
    statement
        .bind_column(ColumnRef::Index(0), &id, ParamType::INT, None)
        .expect("Could not bind the id column");
    statement
        .bind_column("BODY".into(), &body, ParamType::CLOB, None)
        .expect("Could not bind the body column");
    statement
        .bind_column("image".into(), &picture, ParamType::BLOB, None)
        .expect("Could not bind the image column");
    statement
        .fetch_next()
        .expect("Could not fetch")
        .expect("The document exists");
    assert_eq!(id.get(), Value::Int64(7));
    let body = body.get();
    let body = body.as_stream().expect("The body is a stream");
    assert_eq!(body.contents_string().expect("Could not read"), text);
    let picture = picture.get();
    let picture = picture.as_stream().expect("The image is a stream");
    assert_eq!(picture.contents().expect("Could not read"), image);
    statement.close_cursor().expect("Could not close the cursor");
    assert!(body.eof(), "Streams end with the cursor of their large object");
    assert!(body.size().is_err());
    drop(statement);

    lob_round_trip(connection, native, text.as_bytes());
}

/// Writes `body` and a binary image through input bindings, then reads both
/// back through output bindings and through fetched columns.
pub fn lob_round_trip<C: Connection>(connection: &C, native: &MemoryNative, body: &[u8]) {
    const BLOCK: &str = indoc! {"
        BEGIN
            INSERT INTO documents (id, body, image) VALUES (:id, :body, :image)
            RETURNING body, image INTO :stored_body, :stored_image;
        END;
    "};
    native.on(
        BLOCK,
        Script::affected(1)
            .output(":stored_body", Output::Copy(":body".into()))
            .output(":stored_image", Output::Copy(":image".into())),
    );
    let image = (0..=u8::MAX).cycle().take(20_000).collect::<Vec<_>>();

    let mut statement = connection
        .prepare(BLOCK, Vec::new())
        .expect("Could not prepare the block");
    let (stored_body, stored_image) = (Param::new(Value::Null), Param::new(Value::Null));
    statement
        .bind_value(":id", Value::Int64(8), ParamType::INT)
        .expect("Could not bind :id");
    statement
        .bind_param(
            ":body",
            &Param::new(Stream::from_bytes(body.to_vec())),
            ParamType::CLOB,
            None,
        )
        .expect("Could not bind :body");
    statement
        .bind_value(":image", Value::Blob(image.clone().into()), ParamType::BLOB)
        .expect("Could not bind :image");
    statement
        .bind_param(":stored_body", &stored_body, ParamType::CLOB.input_output(), None)
        .expect("Could not bind :stored_body");
    statement
        .bind_param(":stored_image", &stored_image, ParamType::BLOB.input_output(), None)
        .expect("Could not bind :stored_image");
    statement.execute().expect("Could not store the document");
    let read = |param: &Param| {
        param
            .get()
            .as_stream()
            .expect("Output large objects become streams")
            .contents()
            .expect("Could not read")
    };
    assert!(read(&stored_body) == body, "The body reads back unchanged");
    assert!(read(&stored_image) == image, "The image reads back unchanged");
    let executed = native.last_executed().expect("The block was executed");
    let written = [":body", ":image"].map(|name| {
        executed
            .bind(name)
            .map(|v| v.value.clone())
            .expect("The large object was bound")
    });
    drop(statement);

    const SELECT: &str = "SELECT body, image FROM documents WHERE id = 8";
    native.on(
        SELECT,
        Script::rows(
            ResultSet::new()
                .column("BODY", "CLOB")
                .column("IMAGE", "BLOB")
                .row(written),
        ),
    );
    let mut statement = connection.query(SELECT).expect("Could not query the document");
    let row = statement
        .fetch_next()
        .expect("Could not fetch")
        .expect("The document exists")
        .into_row()
        .expect("The default fetch style is associative");
    let contents = |value: &Value| {
        value
            .as_stream()
            .expect("Large object columns are fetched as streams")
            .contents()
            .expect("Could not read")
    };
    assert!(contents(&row["BODY"]) == body, "The body column reads back unchanged");
    assert!(contents(&row["IMAGE"]) == image, "The image column reads back unchanged");
    drop(statement);

    let mut statement = connection.query(SELECT).expect("Could not query the document");
    let rows = statement
        .fetch_all(Some(FetchStyle::Num), FetchArgument::None)
        .expect("Could not fetch the document");
    let FetchedRow::Num(values) = &rows[0] else {
        panic!("Expected a positional row, found {:?}", rows[0]);
    };
    assert!(contents(&values[0]) == body, "The bulk fetched body reads back unchanged");
    assert!(contents(&values[1]) == image, "The bulk fetched image reads back unchanged");
}
