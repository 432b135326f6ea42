//! Link entity model.
//!
//! A link is a reference record placed in a folder that points at another
//! folder, a file, or an external URL. It does not own its target.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dms_core::error::AppError;
use dms_core::types::{FileId, FolderId, LinkId, ProjectId, UserId};

use crate::state::DeletedState;

/// Discriminator of a link target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// Points at a folder.
    Folder,
    /// Points at a file.
    File,
    /// Points at an external URL.
    Url,
}

impl LinkKind {
    /// All kinds, in the order folder contents are listed and copied.
    pub const ALL: [LinkKind; 3] = [LinkKind::Folder, LinkKind::File, LinkKind::Url];

    /// The persisted discriminator.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::File => "file",
            Self::Url => "url",
        }
    }
}

impl std::str::FromStr for LinkKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "folder" => Ok(Self::Folder),
            "file" => Ok(Self::File),
            "url" => Ok(Self::Url),
            other => Err(AppError::database(format!("Unknown link target type: {other}"))),
        }
    }
}

/// What a link points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "target", rename_all = "lowercase")]
pub enum LinkTarget {
    /// Another folder.
    Folder(FolderId),
    /// A file.
    File(FileId),
    /// An external URL.
    Url(String),
}

impl LinkTarget {
    /// The discriminator of this target.
    pub fn kind(&self) -> LinkKind {
        match self {
            Self::Folder(_) => LinkKind::Folder,
            Self::File(_) => LinkKind::File,
            Self::Url(_) => LinkKind::Url,
        }
    }
}

/// A link placed in a folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Unique link identifier.
    pub id: LinkId,
    /// The owning project.
    pub project_id: ProjectId,
    /// The folder holding the link (None at the project root).
    pub folder_id: Option<FolderId>,
    /// The link target.
    pub target: LinkTarget,
    /// Display name.
    pub name: String,
    /// Soft-delete state.
    pub deleted: DeletedState,
    /// The link owner.
    pub user_id: UserId,
    /// When the link was created.
    pub created_at: DateTime<Utc>,
    /// When the link was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Link {
    /// The discriminator of this link's target.
    pub fn kind(&self) -> LinkKind {
        self.target.kind()
    }

    /// Check if the link is visible.
    pub fn is_active(&self) -> bool {
        self.deleted.is_active()
    }
}

/// Data required to create a new link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLink {
    /// The owning project.
    pub project_id: ProjectId,
    /// The folder holding the link.
    pub folder_id: Option<FolderId>,
    /// The link target.
    pub target: LinkTarget,
    /// Display name.
    pub name: String,
    /// The link owner.
    pub user_id: UserId,
}
