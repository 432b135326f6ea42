//! Response cache invalidation around folder writes.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use dms_cache::keys;
use dms_core::result::AppResult;
use dms_core::traits::cache::CacheProvider;
use dms_core::types::{FileId, FolderId, LockId, ProjectId, UserId};
use dms_database::{DestroySummary, EntityStore};
use dms_entity::Visibility;
use dms_entity::custom::{CreateCustomValue, CustomValue};
use dms_entity::file::{CreateFile, DmsFile};
use dms_entity::folder::{CreateFolder, Folder};
use dms_entity::link::{CreateLink, Link, LinkKind};
use dms_entity::lock::{CreateLock, Lock, LockEntity};
use dms_entity::project::{Membership, Project};

/// Entity store decorator that invalidates the cached listing holding a
/// folder before every folder insert, update, and destroy.
///
/// Signals are sent before the write is attempted, so a failed write still
/// leaves the listings invalidated. An update that changes the parent also
/// signals the previous parent's listing. A destroy signals every listing
/// that held a folder of the removed subtree, each key once. Cache failures
/// are logged and never block the write.
#[derive(Debug, Clone)]
pub struct InvalidatingStore<S> {
    inner: S,
    cache: Arc<dyn CacheProvider>,
}

impl<S: EntityStore> InvalidatingStore<S> {
    /// Wraps `inner`, signalling `cache`.
    pub fn new(inner: S, cache: Arc<dyn CacheProvider>) -> Self {
        Self { inner, cache }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn invalidate(&self, project_id: ProjectId, parent_id: Option<FolderId>) {
        let key = keys::propfind(project_id, parent_id);
        if let Err(e) = self.cache.invalidate(&key).await {
            warn!(key = %key, error = %e, "Cache invalidation failed");
        }
    }

    /// The parent of every folder in the subtree rooted at `folder`, deleted
    /// folders included, deduplicated and in walk order.
    async fn subtree_parents(&self, folder: &Folder) -> AppResult<Vec<Option<FolderId>>> {
        let mut parents = vec![folder.parent_id];
        let mut visited = HashSet::from([folder.id]);
        let mut stack = vec![folder.id];

        while let Some(id) = stack.pop() {
            let children = self
                .inner
                .child_folders(folder.project_id, Some(id), Visibility::All)
                .await?;
            if children.is_empty() {
                continue;
            }
            parents.push(Some(id));
            for child in children {
                if visited.insert(child.id) {
                    stack.push(child.id);
                }
            }
        }

        Ok(parents)
    }
}

#[async_trait]
impl<S: EntityStore> EntityStore for InvalidatingStore<S> {
    async fn find_folder(&self, id: FolderId) -> AppResult<Option<Folder>> {
        self.inner.find_folder(id).await
    }

    async fn child_folders(
        &self,
        project_id: ProjectId,
        parent_id: Option<FolderId>,
        scope: Visibility,
    ) -> AppResult<Vec<Folder>> {
        self.inner.child_folders(project_id, parent_id, scope).await
    }

    async fn find_active_by_title(
        &self,
        project_id: ProjectId,
        parent_id: Option<FolderId>,
        title: &str,
    ) -> AppResult<Option<Folder>> {
        self.inner
            .find_active_by_title(project_id, parent_id, title)
            .await
    }

    async fn insert_folder(&self, data: &CreateFolder) -> AppResult<Folder> {
        self.invalidate(data.project_id, data.parent_id).await;
        self.inner.insert_folder(data).await
    }

    async fn update_folder(&self, folder: &Folder) -> AppResult<Folder> {
        self.invalidate(folder.project_id, folder.parent_id).await;
        if let Some(stored) = self.inner.find_folder(folder.id).await? {
            if stored.parent_id != folder.parent_id {
                self.invalidate(stored.project_id, stored.parent_id).await;
            }
        }
        self.inner.update_folder(folder).await
    }

    async fn destroy_folder(&self, folder: &Folder) -> AppResult<DestroySummary> {
        for parent_id in self.subtree_parents(folder).await? {
            self.invalidate(folder.project_id, parent_id).await;
        }
        self.inner.destroy_folder(folder).await
    }

    async fn find_file(&self, id: FileId) -> AppResult<Option<DmsFile>> {
        self.inner.find_file(id).await
    }

    async fn folder_files(
        &self,
        project_id: ProjectId,
        folder_id: Option<FolderId>,
        scope: Visibility,
    ) -> AppResult<Vec<DmsFile>> {
        self.inner.folder_files(project_id, folder_id, scope).await
    }

    async fn insert_file(&self, data: &CreateFile) -> AppResult<DmsFile> {
        self.inner.insert_file(data).await
    }

    async fn folder_links(
        &self,
        project_id: ProjectId,
        folder_id: Option<FolderId>,
        kind: LinkKind,
        scope: Visibility,
    ) -> AppResult<Vec<Link>> {
        self.inner
            .folder_links(project_id, folder_id, kind, scope)
            .await
    }

    async fn insert_link(&self, data: &CreateLink) -> AppResult<Link> {
        self.inner.insert_link(data).await
    }

    async fn entity_locks(&self, entity: LockEntity) -> AppResult<Vec<Lock>> {
        self.inner.entity_locks(entity).await
    }

    async fn insert_lock(&self, data: &CreateLock) -> AppResult<Lock> {
        self.inner.insert_lock(data).await
    }

    async fn find_lock(&self, id: LockId) -> AppResult<Option<Lock>> {
        self.inner.find_lock(id).await
    }

    async fn delete_lock(&self, id: LockId) -> AppResult<bool> {
        self.inner.delete_lock(id).await
    }

    async fn custom_values(&self, folder_id: FolderId) -> AppResult<Vec<CustomValue>> {
        self.inner.custom_values(folder_id).await
    }

    async fn insert_custom_value(&self, data: &CreateCustomValue) -> AppResult<CustomValue> {
        self.inner.insert_custom_value(data).await
    }

    async fn find_project(&self, id: ProjectId) -> AppResult<Option<Project>> {
        self.inner.find_project(id).await
    }

    async fn projects_with_module(&self) -> AppResult<Vec<Project>> {
        self.inner.projects_with_module().await
    }

    async fn memberships(&self, user_id: UserId) -> AppResult<Vec<Membership>> {
        self.inner.memberships(user_id).await
    }
}
