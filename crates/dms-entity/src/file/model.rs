//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use dms_core::types::{FileId, FolderId, ProjectId, UserId};

use crate::state::DeletedState;

/// A document stored in a folder (or at the project root).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DmsFile {
    /// Unique file identifier.
    pub id: FileId,
    /// The owning project.
    pub project_id: ProjectId,
    /// The containing folder (None at the project root).
    pub folder_id: Option<FolderId>,
    /// The file name (including extension).
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Size of the current revision in bytes.
    pub size_bytes: i64,
    /// Soft-delete state.
    #[sqlx(try_from = "i16")]
    pub deleted: DeletedState,
    /// The file owner.
    pub user_id: UserId,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
    /// When the file was last updated.
    pub updated_at: DateTime<Utc>,
}

impl DmsFile {
    /// Check if the file is visible.
    pub fn is_active(&self) -> bool {
        self.deleted.is_active()
    }

    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit('.')
            .next()
            .filter(|ext| *ext != self.name)
            .map(|ext| ext.to_lowercase())
    }
}

/// Data required to create a new file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    /// The owning project.
    pub project_id: ProjectId,
    /// The containing folder.
    pub folder_id: Option<FolderId>,
    /// The file name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Size in bytes.
    pub size_bytes: i64,
    /// The file owner.
    pub user_id: UserId,
}
