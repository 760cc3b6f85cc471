mod binding;
mod connection;
mod diagnostics;
mod driver;
mod handle;
pub mod lob;
mod native;
mod statement;
pub mod types;

pub use connection::*;
pub use driver::*;
pub use native::*;
pub use statement::*;
