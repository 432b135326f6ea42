//! # dms-database
//!
//! The [`EntityStore`] contract and its two backends: PostgreSQL
//! repositories behind [`PgEntityStore`] and the in-process
//! [`MemoryEntityStore`].

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryEntityStore;
pub use postgres::PgEntityStore;
pub use store::{DUPLICATE_TITLE_MESSAGE, DestroySummary, EntityStore};
