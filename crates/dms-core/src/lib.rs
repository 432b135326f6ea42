//! # dms-core
//!
//! Core crate for the document folder workspace. Contains the unified
//! error system, configuration schemas, typed identifiers, and the
//! traits implemented by the outer crates (response cache).
//!
//! This crate has **no** internal dependencies on other workspace crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
