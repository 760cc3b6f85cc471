#[cfg(test)]
mod tests {
    use indoc::indoc;
    use ocibridge_core::{
        AsValue, Attribute, AttributeValue, Connection, DbError, ErrorRecord, FetchArg,
        FetchArgument, FetchStyle, FetchTarget, FetchedRow, Param, ParamType, Result, Statement,
        Value, db_error,
    };
    use ocibridge_oci::{Execution, NativeType, NativeValue, OciConnection};
    use ocibridge_tests::{
        MemoryNative, Op, Output, ResultSet, Script, init_logs, lob_round_trip, silent_logs,
    };
    use std::{any::Any, cell::RefCell, io::Read, rc::Rc};

    fn open(native: &Rc<MemoryNative>, dsn: &str) -> OciConnection<MemoryNative> {
        OciConnection::open(native.clone(), dsn, Some("scott"), Some("tiger"), Vec::new())
            .expect("Could not open the connection")
    }

    fn employees() -> ResultSet {
        ResultSet::new()
            .column("ID", "NUMBER")
            .column("NAME", "VARCHAR2")
            .row([NativeValue::Integer(1), NativeValue::Text("Ada".into())])
            .row([NativeValue::Integer(2), NativeValue::Text("Linus".into())])
    }

    #[derive(Default)]
    struct Employee {
        id: i64,
        name: String,
        team: String,
    }

    impl FetchTarget for Employee {
        fn set_property(&mut self, name: &str, value: Value) -> Result<()> {
            match name {
                "ID" => self.id = i64::try_from_value(value)?,
                "NAME" => self.name = String::try_from_value(value)?,
                _ => {}
            }
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn cursor_promotion() {
        init_logs();
        let native = Rc::new(MemoryNative::new());
        let connection = open(&native, "oci:dbname=FREEPDB1");
        const BLOCK: &str = "BEGIN OPEN :rc FOR SELECT id, name FROM employees; END;";
        native.on(BLOCK, Script::default().cursor(":rc", employees()));
        let mut statement = connection
            .prepare(BLOCK, Vec::new())
            .expect("Could not prepare the block");
        assert_eq!(statement.execution(), Execution::Direct);
        statement
            .bind_param(":rc", &Param::new(Value::Null), ParamType::CURSOR, None)
            .expect("Could not bind the cursor");
        statement.execute().expect("Could not run the block");
        assert_eq!(statement.execution(), Execution::PromotedToCursor);
        assert_eq!(native.freed_statements(), 1, "The block handle is released");
        let id = statement
            .fetch_column(0)
            .expect("Could not fetch")
            .expect("The cursor has rows");
        assert_eq!(id, Value::Int64(1));
        assert!(!statement.is_closed());
        statement.close_cursor().expect("Could not close the cursor");
        assert!(statement.is_closed());
        drop(statement);
        assert_eq!(native.live_statements(), 0);
    }

    #[test]
    fn prefetch() {
        init_logs();
        let native = Rc::new(MemoryNative::new());
        let connection = open(&native, "oci:dbname=FREEPDB1");
        let _first = connection
            .prepare("SELECT 1 FROM dual", Vec::new())
            .expect("Could not prepare");
        assert_eq!(native.last_prefetch(), Some(100));
        let _second = connection
            .prepare(
                "SELECT 2 FROM dual",
                vec![(Attribute::Prefetch, AttributeValue::Int(500))],
            )
            .expect("Could not prepare");
        assert_eq!(native.last_prefetch(), Some(500));
        assert_eq!(
            connection.get_attribute(Attribute::Prefetch),
            Some(AttributeValue::Int(100)),
            "Statement options do not leak into the connection"
        );
    }

    #[test]
    fn array_binding() {
        init_logs();
        let native = Rc::new(MemoryNative::new());
        let connection = open(&native, "oci:dbname=FREEPDB1");
        const BLOCK: &str = indoc! {"
            BEGIN
                :names := rename_all(:names);
            END;
        "};
        native.on(
            BLOCK,
            Script::default().output(
                ":names",
                Output::Value(NativeValue::Array(vec![
                    NativeValue::Text("ADA".into()),
                    NativeValue::Text("LINUS".into()),
                ])),
            ),
        );
        let mut statement = connection
            .prepare(BLOCK, Vec::new())
            .expect("Could not prepare the block");
        let names = Param::new(vec![Value::from("Ada"), Value::from("Linus")]);
        statement
            .bind_param(":names", &names, ParamType::STR.input_output(), Some(30))
            .expect("Could not bind the names");
        statement.execute().expect("Could not run the block");
        let bound = native
            .last_executed()
            .and_then(|v| v.bind(":names").cloned())
            .expect("The names were bound");
        assert_eq!(bound.max_length, 30);
        assert_eq!(bound.native_type, NativeType::CHR);
        assert_eq!(
            names.get(),
            Value::List(vec![Value::from("ADA"), Value::from("LINUS")])
        );
    }

    #[test]
    fn scalar_output() {
        init_logs();
        let native = Rc::new(MemoryNative::new());
        let connection = open(&native, "oci:dbname=FREEPDB1");
        const BLOCK: &str = "BEGIN :total := :left + :right; END;";
        native.on(
            BLOCK,
            Script::default().output(":total", Output::Value(NativeValue::Integer(42))),
        );
        let mut statement = connection
            .prepare(BLOCK, Vec::new())
            .expect("Could not prepare the block");
        let total = Param::new(Value::Null);
        statement
            .bind_param(":total", &total, ParamType::INT.input_output(), Some(40))
            .expect("Could not bind the total");
        statement
            .execute_with(&[(":left", Value::Int64(40)), (":right", Value::Int64(2))])
            .expect("Could not run the block");
        assert_eq!(total.get(), Value::Int64(42));
    }

    #[test]
    fn fetch_object() {
        init_logs();
        let native = Rc::new(MemoryNative::new());
        let connection = open(&native, "oci:dbname=FREEPDB1");
        connection.register_class("Employee", |args| {
            let team = match args.first() {
                Some(v) => String::try_from_value(v.clone())?,
                None => String::new(),
            };
            Ok(Box::new(Employee {
                team,
                ..Default::default()
            }))
        });
        const QUERY: &str = "SELECT id, name FROM employees";
        native.on(QUERY, Script::rows(employees()));
        let mut statement = connection.query(QUERY).expect("Could not query");
        let row = statement
            .fetch_object("Employee", vec![Value::from("compilers")])
            .expect("Could not fetch the employee")
            .expect("There are employees");
        let instance = match row {
            FetchedRow::Instance(instance) => instance,
            other => panic!("Expected an instance, found {:?}", other),
        };
        let employee = instance
            .downcast_ref::<Employee>()
            .expect("The instance is an employee");
        assert_eq!(employee.id, 1);
        assert_eq!(employee.name, "Ada");
        assert_eq!(employee.team, "compilers");
        match statement.fetch_object("stdClass", Vec::new()) {
            Ok(Some(FetchedRow::Object(record))) => {
                assert_eq!(record.get("NAME"), Some(&Value::from("Linus")));
            }
            other => panic!("Expected a generic object, found {:?}", other),
        }
        silent_logs! {
            let error = statement
                .set_fetch_mode(vec![
                    FetchArg::Style(FetchStyle::Class),
                    FetchArg::Class("Manager".into()),
                ])
                .expect_err("Manager is not a registered class");
            assert!(matches!(db_error(&error), Some(DbError::Usage(..))));
        }

        // Fetching into an existing object
        let target = Rc::new(RefCell::new(Employee::default()));
        let mut statement = connection.query(QUERY).expect("Could not query");
        statement
            .set_fetch_mode(vec![
                FetchArg::Style(FetchStyle::Into),
                FetchArg::Object(target.clone()),
            ])
            .expect("Could not set the fetch mode");
        statement.fetch_next().expect("Could not fetch");
        assert_eq!(target.borrow().name, "Ada");
        statement.fetch_next().expect("Could not fetch");
        assert_eq!(target.borrow().name, "Linus");
    }

    fn utf16(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(u16::to_be_bytes).collect()
    }

    #[test]
    fn wide_character_lobs() {
        init_logs();
        let native = Rc::new(MemoryNative::new());
        let connection = open(&native, "oci:dbname=FREEPDB1;charset=AL16UTF16");
        const QUERY: &str = "SELECT notes FROM memos";
        native.on(
            QUERY,
            Script::rows(
                ResultSet::new()
                    .column("NOTES", "CLOB")
                    .row([NativeValue::Text("wïde text".into())]),
            ),
        );
        let mut statement = connection.query(QUERY).expect("Could not query");
        let notes = statement
            .fetch_column(0)
            .expect("Could not fetch")
            .expect("There is a memo");
        let stream = notes.as_stream().expect("The notes are a stream");
        assert_eq!(stream.size().expect("Could not get the size"), 9);
        assert_eq!(
            stream.read_chunk(4).expect("Could not read"),
            utf16("wï"),
            "Four bytes are two characters"
        );
        assert_eq!(stream.contents().expect("Could not read"), utf16("de text"));

        // Wider characters, fewer of them per read
        let mut statement = connection
            .prepare(QUERY, vec![(Attribute::LobCharWidth, AttributeValue::Int(4))])
            .expect("Could not prepare");
        statement.execute().expect("Could not query");
        let notes = statement
            .fetch_column(0)
            .expect("Could not fetch")
            .expect("There is a memo");
        let stream = notes.as_stream().expect("The notes are a stream");
        let mut buffer = [0; 8];
        let read = stream.clone().read(&mut buffer).expect("Could not read");
        assert_eq!(buffer[..read], utf16("wï"));
        assert_eq!(stream.contents().expect("Could not read"), utf16("de text"));
    }

    #[test]
    fn wide_lob_round_trip() {
        init_logs();
        let native = Rc::new(MemoryNative::new());
        let connection = open(&native, "oci:dbname=FREEPDB1;charset=AL16UTF16");
        lob_round_trip(&connection, &native, &utf16(&"Zażółć gęślą jaźń. ".repeat(500)));
        assert_eq!(native.live_lobs(), 0);
    }

    fn memos() -> ResultSet {
        ResultSet::new()
            .column("ID", "NUMBER")
            .column("NOTES", "CLOB")
            .row([NativeValue::Integer(1), NativeValue::Text("long text".into())])
            .row([NativeValue::Integer(2), NativeValue::Text("short".into())])
            .row([NativeValue::Integer(3), NativeValue::Text("".into())])
    }

    #[test]
    fn fetch_all_lobs_outlive_the_cursor() {
        init_logs();
        let native = Rc::new(MemoryNative::new());
        let connection = open(&native, "oci:dbname=FREEPDB1");
        const QUERY: &str = "SELECT id, notes FROM memos";
        native.on(QUERY, Script::rows(memos()));
        let mut statement = connection.query(QUERY).expect("Could not query");
        let rows = statement
            .fetch_all(Some(FetchStyle::Assoc), FetchArgument::None)
            .expect("Could not fetch the memos");
        assert!(statement.is_closed());
        assert_eq!(native.live_lobs(), 0, "The locators went with the cursor");
        let notes = rows
            .iter()
            .map(|row| {
                row.get("NOTES")
                    .and_then(Value::as_stream)
                    .expect("The notes are a stream")
                    .contents_string()
                    .expect("Could not read")
            })
            .collect::<Vec<_>>();
        assert_eq!(notes, ["long text", "short", ""]);

        let mut statement = connection.query(QUERY).expect("Could not query");
        let notes = statement
            .fetch_all(Some(FetchStyle::Column), FetchArgument::Column(1))
            .expect("Could not fetch the memos");
        let FetchedRow::Value(first) = &notes[0] else {
            panic!("Expected a single value, found {:?}", notes[0]);
        };
        let first = first.as_stream().expect("The notes are a stream");
        assert_eq!(first.contents_string().expect("Could not read"), "long text");
    }

    #[test]
    fn fetch_after_the_last_row() {
        init_logs();
        let native = Rc::new(MemoryNative::new());
        let connection = open(&native, "oci:dbname=FREEPDB1");
        const QUERY: &str = "SELECT id, notes FROM memos";
        native.on(QUERY, Script::rows(memos()));
        let mut statement = connection.query(QUERY).expect("Could not query");
        let rows = statement
            .fetch_all(Some(FetchStyle::Num), FetchArgument::None)
            .expect("Could not fetch the memos");
        assert_eq!(rows.len(), 3);
        assert!(statement.fetch_next().expect("Could not fetch").is_none());
        assert!(statement.fetch_column(0).expect("Could not fetch").is_none());
        assert!(
            statement
                .fetch_object("stdClass", Vec::new())
                .expect("Could not fetch")
                .is_none()
        );
        assert!(
            statement
                .fetch_all(None, FetchArgument::None)
                .expect("Could not fetch")
                .is_empty()
        );
        silent_logs! {
            let error = statement.execute().expect_err("The statement is closed");
            assert!(matches!(db_error(&error), Some(DbError::Usage(..))));
        }
    }

    #[test]
    fn dropped_lob_streams_are_forgotten() {
        init_logs();
        let native = Rc::new(MemoryNative::new());
        let connection = open(&native, "oci:dbname=FREEPDB1");
        const QUERY: &str = "SELECT id, notes FROM memos";
        native.on(QUERY, Script::rows(memos()));

        let mut statement = connection.query(QUERY).expect("Could not query");
        while let Some(notes) = statement.fetch_column(1).expect("Could not fetch") {
            assert!(notes.is_stream());
            assert_eq!(statement.fetched_lobs(), 1);
        }

        let mut statement = connection.query(QUERY).expect("Could not query");
        let mut kept = Vec::new();
        while let Some(notes) = statement.fetch_column(1).expect("Could not fetch") {
            kept.push(notes);
        }
        assert_eq!(statement.fetched_lobs(), 3);
        drop(kept);
        statement.close_cursor().expect("Could not close the cursor");
        assert_eq!(statement.fetched_lobs(), 0);
    }

    #[test]
    fn inline_lob_values() {
        init_logs();
        let native = Rc::new(MemoryNative::new());
        let connection = open(&native, "oci:dbname=FREEPDB1");
        const QUERY: &str = "SELECT id, payload FROM events";
        native.on(
            QUERY,
            Script::rows(
                ResultSet::new()
                    .column("ID", "NUMBER")
                    .column("PAYLOAD", "BLOB")
                    .row([NativeValue::Integer(1), NativeValue::Null])
                    .row([NativeValue::Integer(2), NativeValue::Integer(77)]),
            ),
        );
        let mut statement = connection.query(QUERY).expect("Could not query");
        let row = statement
            .fetch(Some(FetchStyle::Num), Default::default(), 0)
            .expect("Could not fetch")
            .expect("There is a first event");
        assert_eq!(row.at(1), Some(&Value::Null), "Null stays null");
        let row = statement
            .fetch(Some(FetchStyle::Num), Default::default(), 0)
            .expect("Could not fetch")
            .expect("There is a second event");
        let payload = row
            .at(1)
            .and_then(Value::as_stream)
            .expect("Inline values of large object columns are streams");
        assert_eq!(payload.contents_string().expect("Could not read"), "77");
    }

    #[test]
    fn bind_column_rejects_arrays_and_cursors() {
        init_logs();
        let native = Rc::new(MemoryNative::new());
        let connection = open(&native, "oci:dbname=FREEPDB1");
        const QUERY: &str = "SELECT id, name FROM employees";
        native.on(QUERY, Script::rows(employees()));
        let mut statement = connection.query(QUERY).expect("Could not query");
        silent_logs! {
            let error = statement
                .bind_column("ID".into(), &Param::new(Value::List(vec![])), ParamType::INT, None)
                .expect_err("Columns do not bind to lists");
            assert!(matches!(db_error(&error), Some(DbError::Usage(..))));
            let error = statement
                .bind_column("ID".into(), &Param::new(Value::Null), ParamType::CURSOR, None)
                .expect_err("Columns do not bind to cursors");
            assert!(matches!(db_error(&error), Some(DbError::Usage(..))));
        }
    }

    #[test]
    fn native_failures() {
        init_logs();
        let native = Rc::new(MemoryNative::new());
        let connection = open(&native, "oci:dbname=FREEPDB1");
        const UPDATE: &str = "UPDATE employees SET name = :name WHERE id = :id";
        native.on(UPDATE, Script::affected(1));
        let mut statement = connection
            .prepare(UPDATE, Vec::new())
            .expect("Could not prepare the update");

        // A failure without diagnostic does not stop the operation
        native.fail_next(Op::Execute, None);
        statement
            .execute_with(&[(":name", Value::from("Grace")), (":id", Value::Int64(1))])
            .expect("Nothing was reported");
        assert!(native.executed().is_empty());

        native.fail_next(
            Op::Bind,
            Some(ErrorRecord::new(1036, "ORA-01036: illegal variable name/number")),
        );
        silent_logs! {
            let error = statement
                .bind_value(":name", Value::from("Grace"), ParamType::STR)
                .expect_err("The bind failed");
            assert_eq!(
                db_error(&error),
                Some(&DbError::Native {
                    code: 1036,
                    message: format!("ORA-01036: illegal variable name/number in {}", UPDATE),
                })
            );
        }

        // Connection diagnostics surface first
        native.fail_next(
            Op::LobWrite,
            Some(ErrorRecord::new(22275, "ORA-22275: invalid LOB locator specified")),
        );
        silent_logs! {
            let error = statement
                .bind_value(":name", Value::from("Grace"), ParamType::CLOB)
                .expect_err("The large object write failed");
            assert_eq!(
                db_error(&error),
                Some(&DbError::Native {
                    code: 22275,
                    message: "ORA-22275: invalid LOB locator specified".into(),
                })
            );
        }
        assert_eq!(connection.error_info().code, Some(22275));
        drop(statement);
        assert_eq!(native.live_lobs(), 0, "The failed binding was released");
    }
}
