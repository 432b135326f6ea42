//! Core traits defined in `dms-core` and implemented by other crates.

pub mod cache;

pub use cache::CacheProvider;
