//! Link domain entities.

pub mod model;

pub use model::{CreateLink, Link, LinkKind, LinkTarget};
