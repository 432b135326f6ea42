//! # dms-cache
//!
//! Keys of the WebDAV response cache and the providers that hold it.
//! The folder core only ever invalidates entries; see [`keys::propfind`].

pub mod keys;
pub mod memory;
pub mod provider;

pub use provider::CacheManager;
