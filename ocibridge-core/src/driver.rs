use crate::Connection;

pub trait Driver {
    type Connection: Connection;

    /// Backend name the DSN must declare.
    const NAME: &'static str;

    fn get_instance() -> Self;

    fn available_drivers() -> Vec<&'static str> {
        vec![Self::NAME]
    }
}
