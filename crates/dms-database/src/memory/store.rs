//! In-memory entity store using a Tokio mutex for single-node deployments
//! and tests.
//!
//! All tables live behind one mutex, so every operation, including a
//! cascading destroy, is a single critical section.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use dms_core::error::AppError;
use dms_core::result::AppResult;
use dms_core::types::{
    CustomValueId, FileId, FolderId, LinkId, LockId, ProjectId, UserId,
};
use dms_entity::custom::{CreateCustomValue, CustomValue};
use dms_entity::file::{CreateFile, DmsFile};
use dms_entity::folder::{CreateFolder, Folder};
use dms_entity::link::{CreateLink, Link, LinkKind, LinkTarget};
use dms_entity::lock::{CreateLock, Lock, LockEntity};
use dms_entity::project::{Membership, Project};
use dms_entity::{DeletedState, Visibility};

use crate::store::{DUPLICATE_TITLE_MESSAGE, DestroySummary, EntityStore};

/// Internal tables of the memory store.
#[derive(Debug, Default)]
struct Tables {
    folders: HashMap<FolderId, Folder>,
    files: HashMap<FileId, DmsFile>,
    links: HashMap<LinkId, Link>,
    locks: HashMap<LockId, Lock>,
    custom_values: HashMap<CustomValueId, CustomValue>,
    projects: HashMap<ProjectId, Project>,
    memberships: Vec<Membership>,
}

impl Tables {
    fn title_taken(&self, candidate: &Folder) -> bool {
        candidate.is_active()
            && self.folders.values().any(|f| {
                f.id != candidate.id
                    && f.is_active()
                    && f.project_id == candidate.project_id
                    && f.parent_id == candidate.parent_id
                    && f.title == candidate.title
            })
    }

    /// The folder and every descendant, whatever their state.
    fn subtree_ids(&self, root: FolderId) -> HashSet<FolderId> {
        let mut ids = HashSet::from([root]);
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            for folder in self.folders.values() {
                if folder.parent_id == Some(current) && ids.insert(folder.id) {
                    stack.push(folder.id);
                }
            }
        }
        ids
    }
}

/// Entity store keeping every table in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryEntityStore {
    /// Protected tables.
    tables: Arc<Mutex<Tables>>,
}

impl MemoryEntityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a project.
    pub async fn insert_project(&self, project: Project) {
        let mut tables = self.tables.lock().await;
        tables.projects.insert(project.id, project);
    }

    /// Registers a project membership.
    pub async fn insert_membership(&self, membership: Membership) {
        let mut tables = self.tables.lock().await;
        tables.memberships.push(membership);
    }

    /// Sets the deleted state of a file.
    pub async fn set_file_state(&self, id: FileId, state: DeletedState) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        let file = tables
            .files
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;
        file.deleted = state;
        file.updated_at = Utc::now();
        Ok(())
    }

    /// Sets the deleted state of a link.
    pub async fn set_link_state(&self, id: LinkId, state: DeletedState) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        let link = tables
            .links
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Link {id} not found")))?;
        link.deleted = state;
        link.updated_at = Utc::now();
        Ok(())
    }

    /// Overrides the modification time of a file.
    pub async fn set_file_updated_at(&self, id: FileId, at: DateTime<Utc>) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        let file = tables
            .files
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;
        file.updated_at = at;
        Ok(())
    }

    /// Number of stored folders, whatever their state.
    pub async fn folder_count(&self) -> usize {
        self.tables.lock().await.folders.len()
    }

    /// Number of stored links, whatever their state.
    pub async fn link_count(&self) -> usize {
        self.tables.lock().await.links.len()
    }
}

/// A timestamp strictly after `previous`.
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(previous + Duration::microseconds(1))
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn find_folder(&self, id: FolderId) -> AppResult<Option<Folder>> {
        Ok(self.tables.lock().await.folders.get(&id).cloned())
    }

    async fn child_folders(
        &self,
        project_id: ProjectId,
        parent_id: Option<FolderId>,
        scope: Visibility,
    ) -> AppResult<Vec<Folder>> {
        let tables = self.tables.lock().await;
        let mut children: Vec<Folder> = tables
            .folders
            .values()
            .filter(|f| {
                f.project_id == project_id && f.parent_id == parent_id && scope.includes(f.deleted)
            })
            .cloned()
            .collect();
        children.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(children)
    }

    async fn find_active_by_title(
        &self,
        project_id: ProjectId,
        parent_id: Option<FolderId>,
        title: &str,
    ) -> AppResult<Option<Folder>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .folders
            .values()
            .find(|f| {
                f.project_id == project_id
                    && f.parent_id == parent_id
                    && f.is_active()
                    && f.title == title
            })
            .cloned())
    }

    async fn insert_folder(&self, data: &CreateFolder) -> AppResult<Folder> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let folder = Folder {
            id: FolderId::new(),
            project_id: data.project_id,
            parent_id: data.parent_id,
            title: data.title.clone(),
            description: data.description.clone(),
            deleted: DeletedState::Active,
            deleted_by_user_id: None,
            user_id: data.user_id,
            notification: data.notification,
            created_at: now,
            updated_at: now,
        };
        if tables.title_taken(&folder) {
            return Err(AppError::validation(DUPLICATE_TITLE_MESSAGE));
        }
        tables.folders.insert(folder.id, folder.clone());
        Ok(folder)
    }

    async fn update_folder(&self, folder: &Folder) -> AppResult<Folder> {
        let mut tables = self.tables.lock().await;
        let stored = tables
            .folders
            .get(&folder.id)
            .ok_or_else(|| AppError::not_found(format!("Folder {} not found", folder.id)))?;
        if stored.updated_at != folder.updated_at {
            return Err(AppError::conflict(format!(
                "Folder {} was modified concurrently",
                folder.id
            )));
        }
        if tables.title_taken(folder) {
            return Err(AppError::validation(DUPLICATE_TITLE_MESSAGE));
        }
        let mut updated = folder.clone();
        updated.updated_at = next_timestamp(folder.updated_at);
        tables.folders.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn destroy_folder(&self, folder: &Folder) -> AppResult<DestroySummary> {
        let mut tables = self.tables.lock().await;
        match tables.folders.get(&folder.id) {
            None => return Err(AppError::not_found(format!("Folder {} not found", folder.id))),
            Some(stored) if stored.updated_at != folder.updated_at => {
                return Err(AppError::conflict(format!(
                    "Folder {} was modified concurrently",
                    folder.id
                )));
            }
            Some(_) => {}
        }

        let folder_ids = tables.subtree_ids(folder.id);
        let file_ids: HashSet<FileId> = tables
            .files
            .values()
            .filter(|f| f.folder_id.is_some_and(|id| folder_ids.contains(&id)))
            .map(|f| f.id)
            .collect();

        let mut summary = DestroySummary::default();

        tables.links.retain(|_, link| {
            let held = link.folder_id.is_some_and(|id| folder_ids.contains(&id));
            let targeted = match &link.target {
                LinkTarget::Folder(id) => folder_ids.contains(id),
                LinkTarget::File(id) => file_ids.contains(id),
                LinkTarget::Url(_) => false,
            };
            let remove = held || targeted;
            if remove {
                summary.links += 1;
            }
            !remove
        });
        tables.locks.retain(|_, lock| {
            let remove = match lock.entity {
                LockEntity::Folder(id) => folder_ids.contains(&id),
                LockEntity::File(id) => file_ids.contains(&id),
            };
            if remove {
                summary.locks += 1;
            }
            !remove
        });
        tables.custom_values.retain(|_, value| {
            let remove = folder_ids.contains(&value.folder_id);
            if remove {
                summary.custom_values += 1;
            }
            !remove
        });
        tables.files.retain(|id, _| !file_ids.contains(id));
        tables.folders.retain(|id, _| !folder_ids.contains(id));
        summary.files = file_ids.len() as u64;
        summary.folders = folder_ids.len() as u64;

        debug!(folder_id = %folder.id, ?summary, "Destroyed folder subtree");
        Ok(summary)
    }

    async fn find_file(&self, id: FileId) -> AppResult<Option<DmsFile>> {
        Ok(self.tables.lock().await.files.get(&id).cloned())
    }

    async fn folder_files(
        &self,
        project_id: ProjectId,
        folder_id: Option<FolderId>,
        scope: Visibility,
    ) -> AppResult<Vec<DmsFile>> {
        let tables = self.tables.lock().await;
        let mut files: Vec<DmsFile> = tables
            .files
            .values()
            .filter(|f| {
                f.project_id == project_id && f.folder_id == folder_id && scope.includes(f.deleted)
            })
            .cloned()
            .collect();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    async fn insert_file(&self, data: &CreateFile) -> AppResult<DmsFile> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let file = DmsFile {
            id: FileId::new(),
            project_id: data.project_id,
            folder_id: data.folder_id,
            name: data.name.clone(),
            description: data.description.clone(),
            size_bytes: data.size_bytes,
            deleted: DeletedState::Active,
            user_id: data.user_id,
            created_at: now,
            updated_at: now,
        };
        tables.files.insert(file.id, file.clone());
        Ok(file)
    }

    async fn folder_links(
        &self,
        project_id: ProjectId,
        folder_id: Option<FolderId>,
        kind: LinkKind,
        scope: Visibility,
    ) -> AppResult<Vec<Link>> {
        let tables = self.tables.lock().await;
        let mut links: Vec<Link> = tables
            .links
            .values()
            .filter(|l| {
                l.project_id == project_id
                    && l.folder_id == folder_id
                    && l.kind() == kind
                    && scope.includes(l.deleted)
            })
            .cloned()
            .collect();
        links.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(links)
    }

    async fn insert_link(&self, data: &CreateLink) -> AppResult<Link> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let link = Link {
            id: LinkId::new(),
            project_id: data.project_id,
            folder_id: data.folder_id,
            target: data.target.clone(),
            name: data.name.clone(),
            deleted: DeletedState::Active,
            user_id: data.user_id,
            created_at: now,
            updated_at: now,
        };
        tables.links.insert(link.id, link.clone());
        Ok(link)
    }

    async fn entity_locks(&self, entity: LockEntity) -> AppResult<Vec<Lock>> {
        let tables = self.tables.lock().await;
        let mut locks: Vec<Lock> = tables
            .locks
            .values()
            .filter(|l| l.entity == entity)
            .cloned()
            .collect();
        locks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(locks)
    }

    async fn insert_lock(&self, data: &CreateLock) -> AppResult<Lock> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let lock = Lock {
            id: LockId::new(),
            entity: data.entity,
            user_id: data.user_id,
            expires_at: data.expires_at,
            created_at: now,
            updated_at: now,
        };
        tables.locks.insert(lock.id, lock.clone());
        Ok(lock)
    }

    async fn find_lock(&self, id: LockId) -> AppResult<Option<Lock>> {
        Ok(self.tables.lock().await.locks.get(&id).cloned())
    }

    async fn delete_lock(&self, id: LockId) -> AppResult<bool> {
        Ok(self.tables.lock().await.locks.remove(&id).is_some())
    }

    async fn custom_values(&self, folder_id: FolderId) -> AppResult<Vec<CustomValue>> {
        let tables = self.tables.lock().await;
        let mut values: Vec<CustomValue> = tables
            .custom_values
            .values()
            .filter(|v| v.folder_id == folder_id)
            .cloned()
            .collect();
        values.sort_by_key(|v| v.custom_field_id);
        Ok(values)
    }

    async fn insert_custom_value(&self, data: &CreateCustomValue) -> AppResult<CustomValue> {
        let mut tables = self.tables.lock().await;
        let value = CustomValue {
            id: CustomValueId::new(),
            custom_field_id: data.custom_field_id,
            folder_id: data.folder_id,
            value: data.value.clone(),
        };
        tables.custom_values.insert(value.id, value.clone());
        Ok(value)
    }

    async fn find_project(&self, id: ProjectId) -> AppResult<Option<Project>> {
        Ok(self.tables.lock().await.projects.get(&id).cloned())
    }

    async fn projects_with_module(&self) -> AppResult<Vec<Project>> {
        let tables = self.tables.lock().await;
        let mut projects: Vec<Project> = tables
            .projects
            .values()
            .filter(|p| p.dms_enabled)
            .cloned()
            .collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    async fn memberships(&self, user_id: UserId) -> AppResult<Vec<Membership>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dms_core::error::ErrorKind;
    use dms_entity::folder::NotificationSetting;

    fn create(project_id: ProjectId, parent_id: Option<FolderId>, title: &str) -> CreateFolder {
        CreateFolder {
            project_id,
            parent_id,
            title: title.to_string(),
            description: None,
            user_id: UserId::new(),
            notification: NotificationSetting::Inherit,
        }
    }

    #[tokio::test]
    async fn test_duplicate_active_sibling_rejected() {
        let store = MemoryEntityStore::new();
        let project = ProjectId::new();
        store.insert_folder(&create(project, None, "Reports")).await.unwrap();

        let err = store
            .insert_folder(&create(project, None, "Reports"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_stale_update_conflicts() {
        let store = MemoryEntityStore::new();
        let folder = store
            .insert_folder(&create(ProjectId::new(), None, "Specs"))
            .await
            .unwrap();

        let mut renamed = folder.clone();
        renamed.title = "Specifications".to_string();
        let stored = store.update_folder(&renamed).await.unwrap();
        assert!(stored.updated_at > folder.updated_at);

        let mut stale = folder.clone();
        stale.title = "Other".to_string();
        let err = store.update_folder(&stale).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_destroy_removes_subtree_and_referencing_links() {
        let store = MemoryEntityStore::new();
        let project = ProjectId::new();
        let user = UserId::new();
        let parent = store.insert_folder(&create(project, None, "A")).await.unwrap();
        let child = store
            .insert_folder(&create(project, Some(parent.id), "B"))
            .await
            .unwrap();
        let other = store.insert_folder(&create(project, None, "C")).await.unwrap();
        store
            .insert_file(&CreateFile {
                project_id: project,
                folder_id: Some(child.id),
                name: "notes.txt".to_string(),
                description: None,
                size_bytes: 5,
                user_id: user,
            })
            .await
            .unwrap();
        store
            .insert_link(&CreateLink {
                project_id: project,
                folder_id: Some(other.id),
                target: LinkTarget::Folder(child.id),
                name: "shortcut".to_string(),
                user_id: user,
            })
            .await
            .unwrap();

        let summary = store.destroy_folder(&parent).await.unwrap();
        assert_eq!(summary.folders, 2);
        assert_eq!(summary.files, 1);
        assert_eq!(summary.links, 1);
        assert_eq!(store.folder_count().await, 1);
        assert_eq!(store.link_count().await, 0);
    }
}
