//! Pure building blocks shared by the PayRun client crates.
//!
//! Nothing in this crate performs network or file I/O:
//! - `auth`: OAuth1 request signing
//! - `codec`: canonical document tree, XML and JSON wire forms, typed mapping
//! - `time`: clock abstraction used for backoff sleeps and timestamps
//! - `error`: `CommonError` for codec and signing failures
//!
//! # Features
//! - `test-utils`: exposes `MockClock` to downstream test suites

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod codec;
pub mod error;
pub mod time;

// Re-export commonly used types and traits for convenience
pub use auth::{HmacSha1Signer, SignatureGenerator, SigningRequest};
pub use codec::{Codec, Element, WireFormat};
pub use error::{CommonError, CommonResult};
pub use time::{Clock, SystemClock};
