//! Time abstraction
//!
//! The transport sleeps between refused attempts and the signer stamps each
//! request with the current epoch second. Both read time through [`Clock`]
//! so tests can observe backoff without waiting.

pub mod clock;

#[cfg(any(test, feature = "test-utils"))]
pub use clock::MockClock;
pub use clock::{Clock, SystemClock};
