//! Folder tree, lifecycle, and copy services.

pub mod copy;
pub mod lifecycle;
pub mod service;
pub mod tree;

pub use copy::{CopyFailure, CopyItem, CopyReport, CopyService};
pub use lifecycle::{DeleteOutcome, LifecycleService};
pub use service::FolderService;
pub use tree::TreeService;
