//! Retrying HTTP transport

pub mod client;
pub mod request;
pub mod transport;

pub use client::{HttpClient, HttpClientBuilder};
pub use request::{PreparedRequest, RawResponse};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportErrorKind};
