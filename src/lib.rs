//! # dms
//!
//! Wiring for the document folder core: builds the entity store, response
//! cache, and folder services from an [`AppConfig`](dms_core::config::AppConfig),
//! and initialises logging for the `dms` binary.

pub mod app;
pub mod telemetry;

pub use app::App;
