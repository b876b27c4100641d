//! PayRun REST API client
//!
//! [`ApiClient`] is the only type callers need: it signs each request with
//! two-legged OAuth1, negotiates XML or JSON, retries refused connections
//! and maps error statuses onto [`PayRunError`](payrun_domain::PayRunError).

pub mod client;
pub mod error_body;
pub mod resource;

pub use client::{ApiClient, ApiClientBuilder};
pub use error_body::{extract_error_details, rejection_message};
pub use resource::LinkedResource;
