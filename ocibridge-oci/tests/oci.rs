#[cfg(test)]
mod tests {
    use ocibridge_core::{Connection, Driver};
    use ocibridge_oci::{NAME, OciDriver};
    use ocibridge_tests::{MemoryNative, execute_tests, init_logs};
    use std::rc::Rc;

    #[test]
    fn oci() {
        init_logs();
        let native = Rc::new(MemoryNative::new());
        let driver = OciDriver::<MemoryNative>::get_instance();
        assert_eq!(OciDriver::<MemoryNative>::available_drivers(), [NAME]);
        let connection = driver
            .connect(
                native.clone(),
                "oci:dbname=//localhost:1521/FREEPDB1;charset=AL32UTF8",
                Some("scott"),
                Some("tiger"),
                Vec::new(),
            )
            .expect("Could not open the connection");
        execute_tests(&connection, &native);
        connection.close().expect("Could not close the connection");
        assert_eq!(native.open_connections(), 0);
        assert_eq!(native.live_statements(), 0);
        assert_eq!(native.live_lobs(), 0);
    }
}
