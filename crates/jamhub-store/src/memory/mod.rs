//! In-process document store.

pub mod store;

pub use store::MemoryDocumentStore;
