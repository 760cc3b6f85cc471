use crate::{MemoryNative, Script, silent_logs};
use ocibridge_core::{
    Attribute, Connection, DbError, ErrorInfo, ErrorMode, ErrorRecord, ParamType, Statement,
    db_error,
};

pub fn errors<C: Connection>(connection: &C, native: &MemoryNative) {
    const QUERY: &str = "SELECT * FROM missing_table";
    native.on(
        QUERY,
        Script::error(
            ErrorRecord::new(942, "ORA-00942: table or view does not exist").at(QUERY, 14),
        ),
    );

    // Exception
    let mut statement = connection
        .prepare(QUERY, Vec::new())
        .expect("Could not prepare the query");
    assert_eq!(statement.error_code(), ErrorInfo::NONE);
    silent_logs! {
        let error = statement.execute().expect_err("The table does not exist");
        assert_eq!(
            db_error(&error),
            Some(&DbError::Native {
                code: 942,
                message: "ORA-00942: table or view does not exist in SELECT * FROM missing_table at 14"
                    .into(),
            })
        );
    }
    let info = statement.error_info();
    assert_eq!(info.sqlstate, ErrorInfo::GENERAL);
    assert_eq!(info.code, Some(942));
    assert_eq!(
        info.message.as_deref(),
        Some("ORA-00942: table or view does not exist")
    );
    drop(statement);

    // Silent and warning modes report the failure without the backend detail
    for mode in [ErrorMode::Silent, ErrorMode::Warning] {
        let mut statement = connection
            .prepare(QUERY, vec![(Attribute::ErrorMode, mode.into())])
            .expect("Could not prepare the query");
        silent_logs! {
            let error = statement.execute().expect_err("The table does not exist");
            assert_eq!(db_error(&error), Some(&DbError::Reported { code: 942 }));
        }
        assert_eq!(statement.error_code(), ErrorInfo::GENERAL);
    }

    // Quoting
    assert_eq!(
        connection
            .quote("O'Reilly", ParamType::STR)
            .expect("Could not quote"),
        "'O''Reilly'"
    );
    silent_logs! {
        let error = connection
            .quote("1", ParamType::INT)
            .expect_err("Only strings can be quoted");
        assert!(matches!(db_error(&error), Some(DbError::Usage(..))));
        let error = connection
            .last_insert_id(None)
            .expect_err("There is no last insert id");
        assert!(matches!(db_error(&error), Some(DbError::NotImplemented(..))));
    }
    assert_eq!(connection.error_code(), ErrorInfo::NONE);

    // Forward only cursors
    let mut statement = connection
        .prepare("SELECT 1 FROM dual", Vec::new())
        .expect("Could not prepare the query");
    silent_logs! {
        let not_implemented = |error: &ocibridge_core::Error| {
            matches!(db_error(error), Some(DbError::NotImplemented(..)))
        };
        assert!(not_implemented(&statement.next_rowset().expect_err("No rowsets")));
        assert!(not_implemented(&statement.debug_dump_params().expect_err("No dump")));
        assert!(not_implemented(&statement.current().expect_err("No iteration")));
        assert!(not_implemented(&statement.key().expect_err("No iteration")));
        assert!(not_implemented(&statement.next().expect_err("No iteration")));
        assert!(not_implemented(&statement.rewind().expect_err("No iteration")));
        assert!(not_implemented(&statement.valid().expect_err("No iteration")));
    }
}
