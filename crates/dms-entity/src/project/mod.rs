//! Project, membership, and role entities.

pub mod model;

pub use model::{Membership, Permission, Project, Role};
