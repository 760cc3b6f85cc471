mod attributes;
mod column;
mod connection;
mod driver;
mod dsn;
mod error;
mod fetch;
mod param_type;
mod row;
mod statement;
mod stream;
mod util;
mod value;

pub use ::anyhow::Context;
pub use attributes::*;
pub use column::*;
pub use connection::*;
pub use driver::*;
pub use dsn::*;
pub use error::*;
pub use fetch::*;
pub use param_type::*;
pub use row::*;
pub use statement::*;
pub use stream::*;
pub use util::*;
pub use value::*;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
