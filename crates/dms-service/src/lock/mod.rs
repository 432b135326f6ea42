//! Folder and file locks.

pub mod service;

pub use service::LockService;
