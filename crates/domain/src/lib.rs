//! # PayRun Domain
//!
//! Domain types for the PayRun client.
//!
//! This crate contains:
//! - The caller-facing error taxonomy and Result definition
//! - Credentials and endpoint configuration structures
//! - Protocol constants
//! - The link DTOs returned by create and list operations
//!
//! ## Architecture
//! - No dependencies on other PayRun crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
