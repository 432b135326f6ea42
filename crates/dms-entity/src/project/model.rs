//! Project entity model.
//!
//! Projects own folder trees. Only the attributes the folder core consults
//! are modelled here: the notification default, the module flag, and the
//! role permissions of a user's memberships.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use dms_core::types::{ProjectId, UserId};

/// A project owning folder trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Project {
    /// Unique project identifier.
    pub id: ProjectId,
    /// Display name.
    pub name: String,
    /// Whether root-level folders notify unless they say otherwise.
    pub notification_default: bool,
    /// Whether the document module is enabled for the project.
    pub dms_enabled: bool,
}

/// A permission a role may grant within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Browse folders and download files.
    ViewFiles,
    /// Create, rename, move, and delete folders.
    FolderManipulation,
    /// Upload, update, and delete files.
    FileManipulation,
    /// Lock and unlock folders and files held by others.
    ForceUnlock,
}

/// A named set of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role name.
    pub name: String,
    /// Permissions granted by the role.
    pub permissions: Vec<Permission>,
}

impl Role {
    /// Whether the role grants `permission`.
    pub fn allowed_to(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

/// A user's membership in a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// The project.
    pub project_id: ProjectId,
    /// The member.
    pub user_id: UserId,
    /// Roles held in the project.
    pub roles: Vec<Role>,
}

impl Membership {
    /// Whether any single role grants every permission in `required`.
    pub fn any_role_allows_all(&self, required: &[Permission]) -> bool {
        self.roles
            .iter()
            .any(|role| required.iter().all(|p| role.allowed_to(*p)))
    }
}
