//! ed2k backend abstraction.
//!
//! The daemon's own remote-control protocol lives outside this crate; it is
//! consumed only through the `MuleBackend` trait.

mod http;
mod types;

pub use http::HttpBackendClient;
pub use types::*;
