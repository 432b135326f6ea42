//! Lock acquisition, release, and inherited lock checks.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use dms_core::error::AppError;
use dms_core::result::AppResult;
use dms_core::types::{FileId, FolderId, LockId, ProjectId};
use dms_database::EntityStore;
use dms_entity::file::DmsFile;
use dms_entity::folder::Folder;
use dms_entity::lock::{CreateLock, Lock, LockEntity};

use crate::context::RequestContext;
use crate::folder::TreeService;
use crate::guard::ProjectGuards;

/// Tracks locks on folders and files.
///
/// A folder is locked when it or any ancestor holds an active lock; a
/// file is locked when it does or its folder is.
#[derive(Debug, Clone)]
pub struct LockService {
    store: Arc<dyn EntityStore>,
    tree: TreeService,
    guards: ProjectGuards,
}

impl LockService {
    /// Creates a new lock service.
    pub fn new(store: Arc<dyn EntityStore>, tree: TreeService, guards: ProjectGuards) -> Self {
        Self {
            store,
            tree,
            guards,
        }
    }

    /// Active locks on `entity`, most recent first.
    pub async fn active_locks(&self, entity: LockEntity) -> AppResult<Vec<Lock>> {
        let now = Utc::now();
        Ok(self
            .store
            .entity_locks(entity)
            .await?
            .into_iter()
            .filter(|lock| lock.is_active_at(now))
            .collect())
    }

    /// Whether `folder` or one of its ancestors is locked.
    pub async fn is_locked(&self, folder: &Folder) -> AppResult<bool> {
        Ok(self.locking_folder(folder).await?.is_some())
    }

    /// Whether `file`, or the folder chain holding it, is locked.
    pub async fn is_file_locked(&self, file: &DmsFile) -> AppResult<bool> {
        if !self.active_locks(LockEntity::File(file.id)).await?.is_empty() {
            return Ok(true);
        }
        match file.folder_id {
            Some(folder_id) => match self.store.find_folder(folder_id).await? {
                Some(folder) => self.is_locked(&folder).await,
                None => Ok(false),
            },
            None => Ok(false),
        }
    }

    /// Locks a folder and, by inheritance, its subtree.
    pub async fn lock_folder(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<Lock> {
        let folder = self.folder(folder_id).await?;
        let _guard = self.guards.acquire(folder.project_id).await;

        if let Some(holder) = self.locking_folder(&folder).await? {
            return Err(AppError::locked(format!(
                "Folder '{}' is already locked through '{}'",
                folder.title, holder.title
            )));
        }

        let lock = self
            .store
            .insert_lock(&CreateLock {
                entity: LockEntity::Folder(folder.id),
                user_id: ctx.user_id,
                expires_at,
            })
            .await?;

        info!(user_id = %ctx.user_id, folder_id = %folder.id, lock_id = %lock.id, "Folder locked");
        Ok(lock)
    }

    /// Locks a single file.
    pub async fn lock_file(
        &self,
        ctx: &RequestContext,
        file_id: FileId,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<Lock> {
        let file = self
            .store
            .find_file(file_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))?;
        let _guard = self.guards.acquire(file.project_id).await;

        if self.is_file_locked(&file).await? {
            return Err(AppError::locked(format!("File '{}' is already locked", file.name)));
        }

        let lock = self
            .store
            .insert_lock(&CreateLock {
                entity: LockEntity::File(file.id),
                user_id: ctx.user_id,
                expires_at,
            })
            .await?;

        info!(user_id = %ctx.user_id, file_id = %file.id, lock_id = %lock.id, "File locked");
        Ok(lock)
    }

    /// Releases a lock. Only its holder or an admin may do so.
    pub async fn unlock(&self, ctx: &RequestContext, lock_id: LockId) -> AppResult<()> {
        let lock = self
            .store
            .find_lock(lock_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Lock {lock_id} not found")))?;

        if lock.user_id != ctx.user_id && !ctx.is_admin() {
            return Err(AppError::authorization(
                "Only the lock holder or an administrator can unlock",
            ));
        }

        let _guard = match self.project_of(lock.entity).await? {
            Some(project_id) => Some(self.guards.acquire(project_id).await),
            None => None,
        };
        self.store.delete_lock(lock.id).await?;

        info!(user_id = %ctx.user_id, lock_id = %lock.id, "Lock released");
        Ok(())
    }

    /// The nearest folder, starting at `folder` and walking up, that
    /// holds an active lock.
    async fn locking_folder(&self, folder: &Folder) -> AppResult<Option<Folder>> {
        let mut visited = HashSet::new();
        let mut current = Some(folder.clone());

        while let Some(candidate) = current {
            if !visited.insert(candidate.id) || visited.len() > self.tree.max_depth() + 1 {
                return Err(AppError::validation(format!(
                    "Folder tree exceeds the maximum depth of {}",
                    self.tree.max_depth()
                )));
            }
            if !self
                .active_locks(LockEntity::Folder(candidate.id))
                .await?
                .is_empty()
            {
                return Ok(Some(candidate));
            }
            current = match candidate.parent_id {
                Some(parent_id) => self.store.find_folder(parent_id).await?,
                None => None,
            };
        }

        Ok(None)
    }

    async fn folder(&self, folder_id: FolderId) -> AppResult<Folder> {
        self.store
            .find_folder(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))
    }

    async fn project_of(&self, entity: LockEntity) -> AppResult<Option<ProjectId>> {
        Ok(match entity {
            LockEntity::Folder(id) => self.store.find_folder(id).await?.map(|f| f.project_id),
            LockEntity::File(id) => self.store.find_file(id).await?.map(|f| f.project_id),
        })
    }
}
