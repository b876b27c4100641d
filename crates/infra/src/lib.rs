//! # PayRun Infrastructure
//!
//! Everything in the client that performs I/O.
//!
//! This crate contains:
//! - `api`: the request pipeline (`ApiClient`)
//! - `http`: the retrying blocking transport
//! - `config`: configuration loading from environment variables or files
//! - `errors`: conversion of foreign errors into `PayRunError`
//!
//! ## Architecture
//! - Builds on the pure codec and signing code in `payrun-common`
//! - Surfaces every failure as `payrun_domain::PayRunError`

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod api;
pub mod config;
pub mod errors;
pub mod http;

// Re-export commonly used items
pub use api::{ApiClient, ApiClientBuilder, LinkedResource};
pub use errors::{InfraError, IntoPayRunError};
pub use http::{
    HttpClient, PreparedRequest, RawResponse, ReqwestTransport, Transport, TransportError,
};

/// Paths used by [`linked_resource!`]; not part of the public API.
#[doc(hidden)]
pub mod __private {
    pub use payrun_common::{Codec, Element};
    pub use payrun_domain::PayRunError;
}
