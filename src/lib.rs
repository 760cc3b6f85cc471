//! Prepared statement client over the handle based Oracle call interface.
//!
//! The backend agnostic vocabulary comes from `ocibridge-core`, the adapter
//! from `ocibridge-oci`, reachable as [`oci`].

pub use ocibridge_core::*;
pub use ocibridge_oci as oci;
pub use ocibridge_oci::{Execution, OciConnection, OciDriver, OciNative, OciStatement};
