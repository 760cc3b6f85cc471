#[cfg(test)]
mod tests {
    use ocibridge::{Attribute, AttributeValue, Connection, DbError, Dsn, OciConnection, db_error};
    use ocibridge_tests::{MemoryNative, init_logs, silent_logs};
    use std::{env, fs, rc::Rc};

    #[test]
    fn parse() {
        let dsn = Dsn::parse("oci:dbname=//db.example.com:1521/ORCLPDB1;charset=WE8MSWIN1252")
            .expect("Could not parse");
        assert_eq!(dsn.driver, "oci");
        assert_eq!(dsn.dbname(), "//db.example.com:1521/ORCLPDB1");
        assert_eq!(dsn.charset(), "WE8MSWIN1252");
        let dsn = Dsn::parse("oci:dbname=ORCL").expect("Could not parse");
        assert_eq!(dsn.charset(), Dsn::DEFAULT_CHARSET);
    }

    #[test]
    fn uri_indirection() {
        init_logs();
        let path = env::temp_dir().join("ocibridge-uri-indirection.dsn");
        fs::write(&path, "oci:dbname=FROMFILE;charset=AL16UTF16\n")
            .expect("Could not write the data source file");
        let native = Rc::new(MemoryNative::new());
        let connection = OciConnection::open(
            native.clone(),
            &format!("uri:{}", path.display()),
            Some("scott"),
            Some("tiger"),
            Vec::new(),
        )
        .expect("Could not open the connection");
        let connected = native.last_connect().expect("The native layer was called");
        assert_eq!(connected.dbname, "FROMFILE");
        assert_eq!(connected.charset, "AL16UTF16");
        assert_eq!(
            connection.get_attribute(Attribute::DriverName),
            Some(AttributeValue::Text("oci".into()))
        );
        fs::remove_file(&path).expect("Could not remove the data source file");

        silent_logs! {
            let error = OciConnection::open(
                native.clone(),
                &format!("uri:{}", path.display()),
                None,
                None,
                Vec::new(),
            )
            .expect_err("The data source file is gone");
            assert!(matches!(db_error(&error), Some(DbError::Configuration(..))));
        }
    }
}
