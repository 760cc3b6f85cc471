mod cursors;
mod errors;
mod fetching;
mod lobs;
mod memory;
mod simple;
mod transactions;

pub use lobs::lob_round_trip;
pub use memory::*;

use crate::{
    cursors::cursors, errors::errors, fetching::fetching, lobs::lobs, simple::simple,
    transactions::transactions,
};
use log::LevelFilter;
use ocibridge_core::Connection;
use std::env;

#[doc(hidden)]
pub use log;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Runs every shared scenario, scripting `native` as it goes.
pub fn execute_tests<C: Connection>(connection: &C, native: &MemoryNative) {
    simple(connection, native);
    fetching(connection, native);
    transactions(connection, native);
    lobs(connection, native);
    cursors(connection, native);
    errors(connection, native);
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = $crate::log::max_level();
        $crate::log::set_max_level($crate::log::LevelFilter::Off);
        $($code)+
        $crate::log::set_max_level(level);
    }};
}
