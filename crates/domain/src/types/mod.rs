//! Domain types and models
//!
//! The DTO catalog itself is supplied by callers; only the link types the
//! pipeline returns from create/list operations live here.

pub mod link;

pub use link::{Link, LinkCollection, LinkList};
