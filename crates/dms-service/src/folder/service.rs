//! Folder creation and in-place updates.

use std::sync::Arc;

use tracing::info;

use dms_core::config::DmsConfig;
use dms_core::error::AppError;
use dms_core::result::AppResult;
use dms_core::types::{CustomFieldId, FolderId, ProjectId};
use dms_database::EntityStore;
use dms_entity::custom::CustomValue;
use dms_entity::folder::{CreateFolder, Folder, NotificationSetting};

use crate::context::RequestContext;
use crate::guard::ProjectGuards;

use super::tree::TreeService;

/// Creates, renames, moves, and describes folders.
#[derive(Debug, Clone)]
pub struct FolderService {
    store: Arc<dyn EntityStore>,
    tree: TreeService,
    guards: ProjectGuards,
    default_notifications: bool,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(
        store: Arc<dyn EntityStore>,
        tree: TreeService,
        guards: ProjectGuards,
        config: &DmsConfig,
    ) -> Self {
        Self {
            store,
            tree,
            guards,
            default_notifications: config.default_notifications,
        }
    }

    /// Gets a folder by ID, whatever its state.
    pub async fn get_folder(&self, folder_id: FolderId) -> AppResult<Folder> {
        self.store
            .find_folder(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))
    }

    /// Lists the visible folders directly under `parent_id`.
    pub async fn list_children(
        &self,
        project_id: ProjectId,
        parent_id: Option<FolderId>,
    ) -> AppResult<Vec<Folder>> {
        self.store
            .child_folders(project_id, parent_id, dms_entity::Visibility::Active)
            .await
    }

    /// A new, unsaved folder owned by the actor with defaults applied.
    pub fn build_folder(
        &self,
        ctx: &RequestContext,
        project_id: ProjectId,
        parent_id: Option<FolderId>,
        title: &str,
        description: Option<String>,
    ) -> CreateFolder {
        CreateFolder {
            project_id,
            parent_id,
            title: title.trim().to_string(),
            description,
            user_id: ctx.user_id,
            notification: if self.default_notifications {
                NotificationSetting::On
            } else {
                NotificationSetting::Inherit
            },
        }
    }

    /// Creates a folder under `parent_id`, or at the project root.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        project_id: ProjectId,
        parent_id: Option<FolderId>,
        title: &str,
        description: Option<String>,
    ) -> AppResult<Folder> {
        let _guard = self.guards.acquire(project_id).await;

        self.store
            .find_project(project_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Project {project_id} not found")))?;
        if let Some(parent_id) = parent_id {
            self.require_parent(project_id, parent_id).await?;
        }

        let data = self.build_folder(ctx, project_id, parent_id, title, description);
        self.tree
            .validate_candidate(project_id, parent_id, &data.title, None)
            .await?;

        let folder = self.store.insert_folder(&data).await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder.id,
            title = %folder.title,
            "Folder created"
        );

        Ok(folder)
    }

    /// Gives a folder a new title.
    pub async fn rename_folder(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        new_title: &str,
    ) -> AppResult<Folder> {
        let project_id = self.get_folder(folder_id).await?.project_id;
        let _guard = self.guards.acquire(project_id).await;
        let mut folder = self.get_folder(folder_id).await?;

        let old_title = std::mem::replace(&mut folder.title, new_title.trim().to_string());
        self.tree.validate_title(&folder).await?;
        let folder = self.store.update_folder(&folder).await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder.id,
            old_title = %old_title,
            new_title = %folder.title,
            "Folder renamed"
        );

        Ok(folder)
    }

    /// Replaces the description of a folder.
    pub async fn update_description(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        description: Option<String>,
    ) -> AppResult<Folder> {
        let project_id = self.get_folder(folder_id).await?.project_id;
        let _guard = self.guards.acquire(project_id).await;
        let mut folder = self.get_folder(folder_id).await?;
        folder.description = description;
        let folder = self.store.update_folder(&folder).await?;

        info!(user_id = %ctx.user_id, folder_id = %folder.id, "Folder description updated");
        Ok(folder)
    }

    /// Moves a folder under `new_parent_id`, or to the project root.
    pub async fn move_folder(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        new_parent_id: Option<FolderId>,
    ) -> AppResult<Folder> {
        let project_id = self.get_folder(folder_id).await?.project_id;
        let _guard = self.guards.acquire(project_id).await;
        let mut folder = self.get_folder(folder_id).await?;

        if let Some(parent_id) = new_parent_id {
            if parent_id != folder.id {
                self.require_parent(folder.project_id, parent_id).await?;
            }
        }
        self.tree.check_cycle(&folder, new_parent_id).await?;

        let old_parent_id = folder.parent_id;
        folder.parent_id = new_parent_id;
        self.tree.validate_title(&folder).await?;
        let folder = self.store.update_folder(&folder).await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder.id,
            from = ?old_parent_id,
            to = ?folder.parent_id,
            "Folder moved"
        );

        Ok(folder)
    }

    /// The custom values of a folder, ordered by field.
    pub async fn custom_values(&self, folder_id: FolderId) -> AppResult<Vec<CustomValue>> {
        self.store.custom_values(folder_id).await
    }

    /// The raw value of one custom field on a folder.
    pub async fn custom_value(
        &self,
        folder_id: FolderId,
        field_id: CustomFieldId,
    ) -> AppResult<Option<String>> {
        Ok(self
            .store
            .custom_values(folder_id)
            .await?
            .into_iter()
            .find(|v| v.custom_field_id == field_id)
            .and_then(|v| v.value))
    }

    /// Loads a parent candidate, which must be visible and in `project_id`.
    async fn require_parent(&self, project_id: ProjectId, parent_id: FolderId) -> AppResult<Folder> {
        let parent = self.get_folder(parent_id).await?;
        if parent.project_id != project_id {
            return Err(AppError::validation(
                "Parent folder belongs to another project",
            ));
        }
        if parent.is_deleted() {
            return Err(AppError::validation("Parent folder is deleted"));
        }
        Ok(parent)
    }
}
