//! Soft-delete, restore, and permanent destroy of folders.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use dms_core::error::AppError;
use dms_core::result::AppResult;
use dms_core::types::FolderId;
use dms_database::{DestroySummary, EntityStore};
use dms_entity::folder::Folder;
use dms_entity::link::LinkKind;
use dms_entity::{DeletedState, Visibility};

use crate::context::RequestContext;
use crate::guard::ProjectGuards;
use crate::lock::LockService;

use super::tree::TreeService;

/// What a successful delete did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// The folder was flagged deleted; its descendants are untouched.
    SoftDeleted {
        /// The stored folder.
        folder: Folder,
    },
    /// The folder and its subtree are gone.
    Destroyed {
        /// Records removed.
        summary: DestroySummary,
    },
}

/// Drives a folder between active, deleted, and destroyed.
#[derive(Debug, Clone)]
pub struct LifecycleService {
    store: Arc<dyn EntityStore>,
    tree: TreeService,
    locks: LockService,
    guards: ProjectGuards,
}

impl LifecycleService {
    /// Creates a new lifecycle service.
    pub fn new(
        store: Arc<dyn EntityStore>,
        tree: TreeService,
        locks: LockService,
        guards: ProjectGuards,
    ) -> Self {
        Self {
            store,
            tree,
            locks,
            guards,
        }
    }

    async fn load(&self, folder_id: FolderId) -> AppResult<Folder> {
        self.store
            .find_folder(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))
    }

    /// Deletes a folder that holds no visible content.
    ///
    /// Fails when the folder or an ancestor is locked, or when any visible
    /// subfolder, file, or link remains directly inside it. A permanent
    /// delete removes the whole subtree in one step; otherwise only the
    /// folder's own flag changes.
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        permanent: bool,
    ) -> AppResult<DeleteOutcome> {
        let project_id = self.load(folder_id).await?.project_id;
        let _guard = self.guards.acquire(project_id).await;
        let mut folder = self.load(folder_id).await?;

        if self.locks.is_locked(&folder).await? {
            return Err(AppError::locked(format!(
                "Folder '{}' is locked",
                folder.title
            )));
        }
        if self.has_visible_content(&folder).await? {
            return Err(AppError::not_empty(format!(
                "Folder '{}' is not empty",
                folder.title
            )));
        }

        if permanent {
            let summary = self.store.destroy_folder(&folder).await?;
            info!(
                user_id = %ctx.user_id,
                folder_id = %folder.id,
                folders = summary.folders,
                files = summary.files,
                links = summary.links,
                "Folder destroyed"
            );
            return Ok(DeleteOutcome::Destroyed { summary });
        }

        folder.deleted = DeletedState::Deleted;
        folder.deleted_by_user_id = Some(ctx.user_id);
        let folder = self.store.update_folder(&folder).await?;

        info!(user_id = %ctx.user_id, folder_id = %folder.id, "Folder deleted");
        Ok(DeleteOutcome::SoftDeleted { folder })
    }

    /// Brings a soft-deleted folder back.
    ///
    /// Only the folder itself is restored; deleted descendants stay deleted.
    pub async fn restore(&self, ctx: &RequestContext, folder_id: FolderId) -> AppResult<Folder> {
        let project_id = self.load(folder_id).await?.project_id;
        let _guard = self.guards.acquire(project_id).await;
        let mut folder = self.load(folder_id).await?;

        if let Some(parent_id) = folder.parent_id {
            let parent_active = self
                .store
                .find_folder(parent_id)
                .await?
                .is_some_and(|parent| parent.is_active());
            if !parent_active {
                return Err(AppError::invalid_parent(format!(
                    "Parent folder of '{}' is missing or deleted",
                    folder.title
                )));
            }
        }
        if folder.is_active() {
            return Ok(folder);
        }

        folder.deleted = DeletedState::Active;
        folder.deleted_by_user_id = None;
        self.tree.validate_title(&folder).await?;
        let folder = self.store.update_folder(&folder).await?;

        info!(user_id = %ctx.user_id, folder_id = %folder.id, "Folder restored");
        Ok(folder)
    }

    async fn has_visible_content(&self, folder: &Folder) -> AppResult<bool> {
        let project = folder.project_id;
        let scope = Some(folder.id);

        if !self
            .store
            .child_folders(project, scope, Visibility::Active)
            .await?
            .is_empty()
        {
            return Ok(true);
        }
        if !self
            .store
            .folder_files(project, scope, Visibility::Active)
            .await?
            .is_empty()
        {
            return Ok(true);
        }
        for kind in LinkKind::ALL {
            if !self
                .store
                .folder_links(project, scope, kind, Visibility::Active)
                .await?
                .is_empty()
            {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use dms_core::error::ErrorKind;
    use dms_entity::link::LinkTarget;

    #[tokio::test]
    async fn test_soft_delete_restore_round_trip() {
        let fx = Fixture::new().await;
        let a = fx.folder(None, "A").await;
        let lifecycle = fx.lifecycle();

        let outcome = lifecycle.delete(&fx.ctx, a.id, false).await.unwrap();
        let DeleteOutcome::SoftDeleted { folder } = outcome else {
            panic!("expected soft delete");
        };
        assert!(folder.is_deleted());
        assert_eq!(folder.deleted_by_user_id, Some(fx.ctx.user_id));

        let restored = lifecycle.restore(&fx.ctx, a.id).await.unwrap();
        assert!(restored.is_active());
        assert_eq!(restored.deleted_by_user_id, None);
    }

    #[tokio::test]
    async fn test_restore_under_deleted_parent_fails() {
        let fx = Fixture::new().await;
        let a = fx.folder(None, "A").await;
        let b = fx.folder(Some(&a), "B").await;
        let lifecycle = fx.lifecycle();

        lifecycle.delete(&fx.ctx, b.id, false).await.unwrap();
        lifecycle.delete(&fx.ctx, a.id, false).await.unwrap();

        let err = lifecycle.restore(&fx.ctx, b.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidParent);
        assert!(fx.reload(&b).await.is_deleted());

        lifecycle.restore(&fx.ctx, a.id).await.unwrap();
        assert!(fx.reload(&b).await.is_deleted());
        lifecycle.restore(&fx.ctx, b.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_restore_rejects_duplicate_title() {
        let fx = Fixture::new().await;
        let first = fx.folder(None, "Reports").await;
        let lifecycle = fx.lifecycle();
        lifecycle.delete(&fx.ctx, first.id, false).await.unwrap();
        fx.folder(None, "Reports").await;

        let err = lifecycle.restore(&fx.ctx, first.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_non_empty_folder_stays_active() {
        let fx = Fixture::new().await;
        let a = fx.folder(None, "A").await;
        fx.file(&a, "report.pdf", 10).await;

        let err = fx.lifecycle().delete(&fx.ctx, a.id, false).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotEmpty);
        assert!(fx.reload(&a).await.is_active());
    }

    #[tokio::test]
    async fn test_links_count_as_content() {
        let fx = Fixture::new().await;
        let a = fx.folder(None, "A").await;
        fx.link(&a, LinkTarget::Url("https://example.com".into()), "site").await;

        let err = fx.lifecycle().delete(&fx.ctx, a.id, true).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotEmpty);
    }

    #[tokio::test]
    async fn test_locked_ancestor_blocks_delete() {
        let fx = Fixture::new().await;
        let a = fx.folder(None, "A").await;
        let b = fx.folder(Some(&a), "B").await;
        fx.locks().lock_folder(&fx.ctx, a.id, None).await.unwrap();

        let err = fx.lifecycle().delete(&fx.ctx, b.id, false).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Locked);
        assert!(fx.reload(&b).await.is_active());
    }

    #[tokio::test]
    async fn test_permanent_delete_removes_hidden_subtree() {
        let fx = Fixture::new().await;
        let a = fx.folder(None, "A").await;
        let b = fx.folder(Some(&a), "B").await;
        fx.file(&b, "old.pdf", 5).await;
        let lifecycle = fx.lifecycle();

        let err = lifecycle.delete(&fx.ctx, b.id, false).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotEmpty);

        let mut hidden = b.clone();
        hidden.deleted = DeletedState::Deleted;
        fx.store.update_folder(&hidden).await.unwrap();

        let outcome = lifecycle.delete(&fx.ctx, a.id, true).await.unwrap();
        let DeleteOutcome::Destroyed { summary } = outcome else {
            panic!("expected destroy");
        };
        assert_eq!(summary.folders, 2);
        assert_eq!(summary.files, 1);
        assert!(fx.store.find_folder(a.id).await.unwrap().is_none());
        assert!(fx.store.find_folder(b.id).await.unwrap().is_none());
    }
}
