//! PostgreSQL-backed [`EntityStore`].

use async_trait::async_trait;
use sqlx::PgPool;

use dms_core::result::AppResult;
use dms_core::types::{FileId, FolderId, LockId, ProjectId, UserId};
use dms_entity::Visibility;
use dms_entity::custom::{CreateCustomValue, CustomValue};
use dms_entity::file::{CreateFile, DmsFile};
use dms_entity::folder::{CreateFolder, Folder};
use dms_entity::link::{CreateLink, Link, LinkKind};
use dms_entity::lock::{CreateLock, Lock, LockEntity};
use dms_entity::project::{Membership, Project};

use crate::repositories::{
    CustomValueRepository, FileRepository, FolderRepository, LinkRepository, LockRepository,
    ProjectRepository,
};
use crate::store::{DestroySummary, EntityStore};

/// Entity store delegating to one repository per table.
#[derive(Debug, Clone)]
pub struct PgEntityStore {
    folders: FolderRepository,
    files: FileRepository,
    links: LinkRepository,
    locks: LockRepository,
    custom_values: CustomValueRepository,
    projects: ProjectRepository,
}

impl PgEntityStore {
    /// Build the repositories over a shared pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            folders: FolderRepository::new(pool.clone()),
            files: FileRepository::new(pool.clone()),
            links: LinkRepository::new(pool.clone()),
            locks: LockRepository::new(pool.clone()),
            custom_values: CustomValueRepository::new(pool.clone()),
            projects: ProjectRepository::new(pool),
        }
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn find_folder(&self, id: FolderId) -> AppResult<Option<Folder>> {
        self.folders.find_by_id(id).await
    }

    async fn child_folders(
        &self,
        project_id: ProjectId,
        parent_id: Option<FolderId>,
        scope: Visibility,
    ) -> AppResult<Vec<Folder>> {
        self.folders.find_children(project_id, parent_id, scope).await
    }

    async fn find_active_by_title(
        &self,
        project_id: ProjectId,
        parent_id: Option<FolderId>,
        title: &str,
    ) -> AppResult<Option<Folder>> {
        self.folders
            .find_active_by_title(project_id, parent_id, title)
            .await
    }

    async fn insert_folder(&self, data: &CreateFolder) -> AppResult<Folder> {
        self.folders.create(data).await
    }

    async fn update_folder(&self, folder: &Folder) -> AppResult<Folder> {
        self.folders.update(folder).await
    }

    async fn destroy_folder(&self, folder: &Folder) -> AppResult<DestroySummary> {
        self.folders.destroy(folder).await
    }

    async fn find_file(&self, id: FileId) -> AppResult<Option<DmsFile>> {
        self.files.find_by_id(id).await
    }

    async fn folder_files(
        &self,
        project_id: ProjectId,
        folder_id: Option<FolderId>,
        scope: Visibility,
    ) -> AppResult<Vec<DmsFile>> {
        self.files.find_by_folder(project_id, folder_id, scope).await
    }

    async fn insert_file(&self, data: &CreateFile) -> AppResult<DmsFile> {
        self.files.create(data).await
    }

    async fn folder_links(
        &self,
        project_id: ProjectId,
        folder_id: Option<FolderId>,
        kind: LinkKind,
        scope: Visibility,
    ) -> AppResult<Vec<Link>> {
        self.links
            .find_by_folder(project_id, folder_id, kind, scope)
            .await
    }

    async fn insert_link(&self, data: &CreateLink) -> AppResult<Link> {
        self.links.create(data).await
    }

    async fn entity_locks(&self, entity: LockEntity) -> AppResult<Vec<Lock>> {
        self.locks.find_by_entity(entity).await
    }

    async fn insert_lock(&self, data: &CreateLock) -> AppResult<Lock> {
        self.locks.create(data).await
    }

    async fn find_lock(&self, id: LockId) -> AppResult<Option<Lock>> {
        self.locks.find_by_id(id).await
    }

    async fn delete_lock(&self, id: LockId) -> AppResult<bool> {
        self.locks.delete(id).await
    }

    async fn custom_values(&self, folder_id: FolderId) -> AppResult<Vec<CustomValue>> {
        self.custom_values.find_by_folder(folder_id).await
    }

    async fn insert_custom_value(&self, data: &CreateCustomValue) -> AppResult<CustomValue> {
        self.custom_values.create(data).await
    }

    async fn find_project(&self, id: ProjectId) -> AppResult<Option<Project>> {
        self.projects.find_by_id(id).await
    }

    async fn projects_with_module(&self) -> AppResult<Vec<Project>> {
        self.projects.find_with_module().await
    }

    async fn memberships(&self, user_id: UserId) -> AppResult<Vec<Membership>> {
        self.projects.find_memberships(user_id).await
    }
}
