#[cfg(test)]
mod tests {
    use ocibridge_core::{
        Attribute, AttributeValue, Connection, DbError, ErrorInfo, ErrorRecord, db_error,
    };
    use ocibridge_oci::{OciConnection, SessionMode};
    use ocibridge_tests::{MemoryNative, Op, init_logs, silent_logs};
    use std::rc::Rc;

    const DSN: &str = "oci:dbname=//localhost:1521/FREEPDB1";

    fn open(native: &Rc<MemoryNative>) -> OciConnection<MemoryNative> {
        OciConnection::open(native.clone(), DSN, Some("scott"), Some("tiger"), Vec::new())
            .expect("Could not open the connection")
    }

    #[test]
    fn wrong_driver() {
        init_logs();
        let native = Rc::new(MemoryNative::new());
        silent_logs! {
            let error = OciConnection::open(
                native.clone(),
                "mysql:dbname=test",
                Some("scott"),
                Some("tiger"),
                Vec::new(),
            )
            .expect_err("Only the oci driver is accepted");
            assert!(matches!(db_error(&error), Some(DbError::Configuration(..))));
            let error = OciConnection::open(native.clone(), "FREEPDB1", None, None, Vec::new())
                .expect_err("The data source name must declare the driver");
            assert!(matches!(db_error(&error), Some(DbError::Configuration(..))));
        }
        assert!(native.last_connect().is_none());
    }

    #[test]
    fn connect_parameters() {
        init_logs();
        let native = Rc::new(MemoryNative::new());
        let connection = open(&native);
        let connected = native.last_connect().expect("The native layer was called");
        assert_eq!(connected.dbname, "//localhost:1521/FREEPDB1");
        assert_eq!(connected.charset, "AL32UTF8");
        assert_eq!(connected.username.as_deref(), Some("scott"));
        assert_eq!(connected.session_mode, SessionMode::Default);
        assert!(!connected.persistent);
        assert_eq!(connection.lob_char_width(), 1);
        assert_eq!(
            connection.get_attribute(Attribute::ServerVersion),
            Some(AttributeValue::Text(
                "Oracle Database 23ai Free Release 23.0.0.0.0".into()
            ))
        );
        assert_eq!(
            connection.get_attribute(Attribute::ClientVersion),
            Some(AttributeValue::Text("23.5.0.24.07".into()))
        );
        drop(connection);

        let connection = OciConnection::open(
            native.clone(),
            "oci:dbname=FREEPDB1;charset=AL16UTF16",
            Some("/"),
            Some(""),
            vec![(Attribute::Persistent, true.into())],
        )
        .expect("Could not open the connection");
        let connected = native.last_connect().expect("The native layer was called");
        assert_eq!(connected.session_mode, SessionMode::CredExt);
        assert_eq!(connected.charset, "AL16UTF16");
        assert!(connected.persistent);
        assert_eq!(connection.lob_char_width(), 2);
        assert!(connection.set_attribute(Attribute::LobCharWidth, AttributeValue::Int(4)));
        assert_eq!(connection.lob_char_width(), 4);
    }

    #[test]
    fn failed_open() {
        init_logs();
        let native = Rc::new(MemoryNative::new());
        let record = ErrorRecord::new(1017, "ORA-01017: invalid username/password; logon denied");
        silent_logs! {
            native.fail_next(Op::Connect, Some(record.clone()));
            let error =
                OciConnection::open(native.clone(), DSN, Some("scott"), Some("x"), Vec::new())
                    .expect_err("The credentials are refused");
            assert_eq!(
                db_error(&error),
                Some(&DbError::Connection {
                    code: 1017,
                    message: record.message.clone(),
                })
            );

            native.fail_next(Op::Connect, Some(record.clone()));
            let error = OciConnection::open(
                native.clone(),
                DSN,
                Some("scott"),
                Some("x"),
                vec![(Attribute::Strict, false.into())],
            )
            .expect_err("The credentials are refused");
            assert_eq!(db_error(&error), Some(&DbError::NoConnection));

            native.fail_next(Op::Connect, None);
            let error =
                OciConnection::open(native.clone(), DSN, Some("scott"), Some("x"), Vec::new())
                    .expect_err("The native layer returned nothing");
            assert!(matches!(
                db_error(&error),
                Some(DbError::Connection { code: 0, .. })
            ));
        }
        assert_eq!(native.open_connections(), 0);
    }

    #[test]
    fn close() {
        init_logs();
        let native = Rc::new(MemoryNative::new());
        let connection = open(&native);
        assert!(connection.is_open());
        assert_eq!(native.open_connections(), 1);
        connection.close().expect("Could not close the connection");
        assert!(!connection.is_open());
        assert_eq!(native.open_connections(), 0);
        connection.close().expect("Closing twice does nothing");
        silent_logs! {
            let error = connection
                .prepare("SELECT 1 FROM dual", Vec::new())
                .expect_err("The connection is closed");
            assert!(matches!(db_error(&error), Some(DbError::Usage(..))));
        }

        let connection = open(&native);
        native.fail_next(
            Op::Close,
            Some(ErrorRecord::new(3113, "ORA-03113: end-of-file on communication channel")),
        );
        silent_logs! {
            let error = connection.close().expect_err("The close failed");
            assert!(matches!(
                db_error(&error),
                Some(DbError::Native { code: 3113, .. })
            ));
        }
        assert_eq!(connection.error_info().code, Some(3113));
        connection.close().expect("The handle is gone after a failed close");
    }

    #[test]
    fn failed_commit_keeps_the_transaction() {
        init_logs();
        let native = Rc::new(MemoryNative::new());
        let connection = open(&native);
        connection
            .begin_transaction()
            .expect("Could not begin a transaction");
        native.fail_next(
            Op::Commit,
            Some(ErrorRecord::new(2091, "ORA-02091: transaction rolled back")),
        );
        silent_logs! {
            assert!(connection.commit().is_err());
        }
        assert!(connection.in_transaction());
        assert_eq!(connection.error_code(), ErrorInfo::GENERAL);
        connection.rollback().expect("Could not roll back");
        assert!(!connection.in_transaction());
    }

    #[test]
    fn parse_errors() {
        init_logs();
        let native = Rc::new(MemoryNative::new());
        let connection = open(&native);
        silent_logs! {
            let error = connection
                .prepare("   ", Vec::new())
                .expect_err("There is nothing to parse");
            assert_eq!(
                db_error(&error),
                Some(&DbError::Native {
                    code: 900,
                    message: "ORA-00900: invalid SQL statement".into(),
                })
            );
        }
        let info = connection.error_info();
        assert_eq!(info.to_string(), "[HY000] 900 ORA-00900: invalid SQL statement");
    }
}
