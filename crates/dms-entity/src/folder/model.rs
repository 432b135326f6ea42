//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use dms_core::types::{FolderId, ProjectId, UserId};

use super::notification::NotificationSetting;
use crate::state::DeletedState;

/// Characters a folder title may not contain.
pub const INVALID_TITLE_CHARACTERS: [char; 10] =
    ['/', '\\', '?', '"', ':', '<', '>', '#', '%', '*'];

/// A folder in a project's document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: FolderId,
    /// The project owning the tree.
    pub project_id: ProjectId,
    /// Parent folder ID (null for folders at the project root).
    pub parent_id: Option<FolderId>,
    /// Folder title, unique among active siblings.
    pub title: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Soft-delete state.
    #[sqlx(try_from = "i16")]
    pub deleted: DeletedState,
    /// The user who soft-deleted the folder.
    pub deleted_by_user_id: Option<UserId>,
    /// The folder owner.
    pub user_id: UserId,
    /// Notification override.
    #[sqlx(try_from = "Option<bool>")]
    pub notification: NotificationSetting,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Check if this folder sits at the project root.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check if this folder has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted == DeletedState::Deleted
    }

    /// Check if this folder is visible.
    pub fn is_active(&self) -> bool {
        self.deleted.is_active()
    }
}

/// Data required to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// The owning project.
    pub project_id: ProjectId,
    /// Parent folder (None for the project root).
    pub parent_id: Option<FolderId>,
    /// Folder title.
    pub title: String,
    /// Free-form description.
    pub description: Option<String>,
    /// The folder owner.
    pub user_id: UserId,
    /// Initial notification override.
    pub notification: NotificationSetting,
}

/// Whether `title` contains a character folders may not use.
pub fn title_has_invalid_character(title: &str) -> bool {
    title.chars().any(|c| INVALID_TITLE_CHARACTERS.contains(&c))
}
