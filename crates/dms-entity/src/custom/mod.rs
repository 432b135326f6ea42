//! Custom field values attached to folders.

pub mod model;

pub use model::{CreateCustomValue, CustomValue};
