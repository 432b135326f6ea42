//! # dms-entity
//!
//! Domain entity models for the document folder core. Every struct in this
//! crate represents a stored record or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`; records whose columns
//! map one-to-one additionally derive `sqlx::FromRow`.

pub mod custom;
pub mod file;
pub mod folder;
pub mod link;
pub mod lock;
pub mod project;
pub mod state;
pub mod user;

pub use state::{DeletedState, Visibility};
