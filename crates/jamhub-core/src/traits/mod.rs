//! Core traits defined in `jamhub-core` and implemented by other crates.

pub mod store;

pub use store::{DocumentStore, merge_fields};
