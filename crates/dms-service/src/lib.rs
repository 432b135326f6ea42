//! # dms-service
//!
//! Folder services for the document folder core. Each service works
//! against an [`EntityStore`](dms_database::EntityStore) handed in at
//! construction; wrap the store in [`InvalidatingStore`] so folder writes
//! reach the response cache.
//!
//! The acting user is always passed explicitly as a [`RequestContext`].

pub mod context;
pub mod folder;
pub mod guard;
pub mod invalidation;
pub mod lock;
pub mod notification;

#[cfg(test)]
pub(crate) mod testing;

pub use context::RequestContext;
pub use folder::{
    CopyReport, CopyService, DeleteOutcome, FolderService, LifecycleService, TreeService,
};
pub use guard::{ProjectGuard, ProjectGuards};
pub use invalidation::InvalidatingStore;
pub use lock::LockService;
pub use notification::NotificationPropagator;
