use crate::{OciConnection, OciNative};
use ocibridge_core::{Attribute, AttributeValue, Driver, Result};
use std::{fmt, marker::PhantomData, rc::Rc};

/// Driver name the data source must declare.
pub const NAME: &str = "oci";

pub struct OciDriver<N: OciNative + 'static> {
    native: PhantomData<N>,
}

impl<N: OciNative + 'static> OciDriver<N> {
    pub const fn new() -> Self {
        Self {
            native: PhantomData,
        }
    }

    /// Opens a connection through `native`, see [`OciConnection::open`].
    pub fn connect(
        &self,
        native: Rc<N>,
        dsn: &str,
        username: Option<&str>,
        password: Option<&str>,
        options: Vec<(Attribute, AttributeValue)>,
    ) -> Result<OciConnection<N>> {
        OciConnection::open(native, dsn, username, password, options)
    }
}

impl<N: OciNative + 'static> Default for OciDriver<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: OciNative + 'static> fmt::Debug for OciDriver<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OciDriver")
    }
}

impl<N: OciNative + 'static> Driver for OciDriver<N> {
    type Connection = OciConnection<N>;

    const NAME: &'static str = NAME;

    fn get_instance() -> Self {
        Self::new()
    }
}
