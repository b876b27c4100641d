//! Infrastructure error plumbing

pub mod conversions;

pub use conversions::{InfraError, IntoPayRunError};
