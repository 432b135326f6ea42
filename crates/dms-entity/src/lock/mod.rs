//! Lock domain entities.

pub mod model;

pub use model::{CreateLock, Lock, LockEntity};
