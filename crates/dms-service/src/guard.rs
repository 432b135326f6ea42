//! Per-project serialisation of check-then-act folder operations.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use dms_core::types::ProjectId;

type GuardTable = DashMap<ProjectId, Arc<Mutex<()>>>;

/// One async mutex per project.
///
/// Lock checks, emptiness checks, and cycle checks are only meaningful if
/// nothing in the same project changes between the check and the write;
/// services hold the project's guard across both. A project's entry is
/// dropped once its last holder releases it and nobody is waiting.
#[derive(Debug, Clone, Default)]
pub struct ProjectGuards {
    guards: Arc<GuardTable>,
}

impl ProjectGuards {
    /// Creates an empty guard table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `project_id`.
    pub async fn acquire(&self, project_id: ProjectId) -> ProjectGuard {
        // Clone the Arc out so the map shard is not held across the await.
        let mutex = self
            .guards
            .entry(project_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let held = mutex.lock_owned().await;
        ProjectGuard {
            held: Some(held),
            project_id,
            table: self.guards.clone(),
        }
    }

    /// Number of projects with a holder or a waiter.
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// Whether no project is held or awaited.
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

/// Exclusive access to one project, released on drop.
#[derive(Debug)]
pub struct ProjectGuard {
    held: Option<OwnedMutexGuard<()>>,
    project_id: ProjectId,
    table: Arc<GuardTable>,
}

impl Drop for ProjectGuard {
    fn drop(&mut self) {
        drop(self.held.take());
        // Waiters clone the Arc under the shard lock, so a count of one
        // means the table holds the only reference.
        self.table
            .remove_if(&self.project_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
