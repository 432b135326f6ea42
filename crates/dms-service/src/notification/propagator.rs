//! Resolves whether changes in a folder notify watchers.

use std::sync::Arc;

use tracing::info;

use dms_core::config::DmsConfig;
use dms_core::error::AppError;
use dms_core::result::AppResult;
use dms_core::types::FolderId;
use dms_database::EntityStore;
use dms_entity::folder::{Folder, NotificationSetting};

use crate::context::RequestContext;

/// Walks the folder → ancestors → project default override chain.
#[derive(Debug, Clone)]
pub struct NotificationPropagator {
    store: Arc<dyn EntityStore>,
    max_depth: usize,
}

impl NotificationPropagator {
    /// Creates a new propagator.
    pub fn new(store: Arc<dyn EntityStore>, config: &DmsConfig) -> Self {
        Self {
            store,
            max_depth: config.max_tree_depth,
        }
    }

    /// The first explicit setting found on `folder` or its ancestors,
    /// falling back to the project default.
    pub async fn should_notify(&self, folder: &Folder) -> AppResult<bool> {
        let mut current = folder.clone();

        for _ in 0..=self.max_depth {
            match current.notification {
                NotificationSetting::On => return Ok(true),
                NotificationSetting::Off => return Ok(false),
                NotificationSetting::Inherit => {}
            }
            let parent = match current.parent_id {
                Some(parent_id) => self.store.find_folder(parent_id).await?,
                None => None,
            };
            match parent {
                Some(parent) => current = parent,
                None => {
                    let project = self
                        .store
                        .find_project(folder.project_id)
                        .await?
                        .ok_or_else(|| {
                            AppError::not_found(format!("Project {} not found", folder.project_id))
                        })?;
                    return Ok(project.notification_default);
                }
            }
        }

        Err(AppError::validation(format!(
            "Folder tree exceeds the maximum depth of {}",
            self.max_depth
        )))
    }

    /// Turns notifications explicitly on.
    pub async fn activate_notifications(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
    ) -> AppResult<Folder> {
        self.set_notification(ctx, folder_id, NotificationSetting::On)
            .await
    }

    /// Clears the folder's own setting so it inherits again.
    pub async fn deactivate_notifications(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
    ) -> AppResult<Folder> {
        self.set_notification(ctx, folder_id, NotificationSetting::Inherit)
            .await
    }

    /// Stores `setting` on the folder. Store failures propagate.
    pub async fn set_notification(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        setting: NotificationSetting,
    ) -> AppResult<Folder> {
        let mut folder = self
            .store
            .find_folder(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))?;
        folder.notification = setting;
        let folder = self.store.update_folder(&folder).await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder.id,
            notification = ?setting,
            "Folder notification changed"
        );
        Ok(folder)
    }
}
