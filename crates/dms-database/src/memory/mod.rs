//! In-process entity store.

pub mod store;

pub use store::MemoryEntityStore;
