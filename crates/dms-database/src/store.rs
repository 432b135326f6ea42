//! The entity store contract consumed by the folder services.
//!
//! Services never hold references between records; every parent, child,
//! file, or link is resolved through the store by id. Implementations must
//! enforce active-sibling title uniqueness themselves and surface a
//! violation as a validation error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use dms_core::result::AppResult;
use dms_core::types::{FileId, FolderId, LockId, ProjectId, UserId};
use dms_entity::Visibility;
use dms_entity::custom::{CreateCustomValue, CustomValue};
use dms_entity::file::{CreateFile, DmsFile};
use dms_entity::folder::{CreateFolder, Folder};
use dms_entity::link::{CreateLink, Link, LinkKind};
use dms_entity::lock::{CreateLock, Lock, LockEntity};
use dms_entity::project::{Membership, Project};

/// Message reported when an active sibling already uses a title.
pub const DUPLICATE_TITLE_MESSAGE: &str = "Title has already been taken";

/// Records removed by a cascading folder destroy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestroySummary {
    /// Folders removed (the target and every descendant).
    pub folders: u64,
    /// Files removed.
    pub files: u64,
    /// Links removed, including links pointing into the destroyed subtree.
    pub links: u64,
    /// Locks removed.
    pub locks: u64,
    /// Custom values removed.
    pub custom_values: u64,
}

/// Durable storage for folders and everything they hold.
#[async_trait]
pub trait EntityStore: Send + Sync + std::fmt::Debug + 'static {
    // ── Folders ────────────────────────────────────────────

    /// Find a folder by ID, whatever its deleted state.
    async fn find_folder(&self, id: FolderId) -> AppResult<Option<Folder>>;

    /// List the folders directly under `parent_id` (the project root when
    /// `None`), ordered by title.
    async fn child_folders(
        &self,
        project_id: ProjectId,
        parent_id: Option<FolderId>,
        scope: Visibility,
    ) -> AppResult<Vec<Folder>>;

    /// Find the active folder titled `title` under `parent_id`.
    async fn find_active_by_title(
        &self,
        project_id: ProjectId,
        parent_id: Option<FolderId>,
        title: &str,
    ) -> AppResult<Option<Folder>>;

    /// Insert a new folder and return the stored record.
    async fn insert_folder(&self, data: &CreateFolder) -> AppResult<Folder>;

    /// Persist every mutable column of `folder`.
    ///
    /// The write only applies while the stored `updated_at` still equals
    /// `folder.updated_at`; otherwise a conflict error is returned. The
    /// stored record, with a fresh `updated_at`, is returned.
    async fn update_folder(&self, folder: &Folder) -> AppResult<Folder>;

    /// Irreversibly remove `folder`, every descendant folder, their files,
    /// links held by or pointing at any of them, their locks, and their
    /// custom values, all or nothing.
    async fn destroy_folder(&self, folder: &Folder) -> AppResult<DestroySummary>;

    // ── Files ──────────────────────────────────────────────

    /// Find a file by ID.
    async fn find_file(&self, id: FileId) -> AppResult<Option<DmsFile>>;

    /// List the files directly in `folder_id`, ordered by name.
    async fn folder_files(
        &self,
        project_id: ProjectId,
        folder_id: Option<FolderId>,
        scope: Visibility,
    ) -> AppResult<Vec<DmsFile>>;

    /// Insert a new file record.
    async fn insert_file(&self, data: &CreateFile) -> AppResult<DmsFile>;

    // ── Links ──────────────────────────────────────────────

    /// List the links of one kind held directly in `folder_id`, ordered by name.
    async fn folder_links(
        &self,
        project_id: ProjectId,
        folder_id: Option<FolderId>,
        kind: LinkKind,
        scope: Visibility,
    ) -> AppResult<Vec<Link>>;

    /// Insert a new link.
    async fn insert_link(&self, data: &CreateLink) -> AppResult<Link>;

    // ── Locks ──────────────────────────────────────────────

    /// List every lock record on `entity`, most recently updated first.
    async fn entity_locks(&self, entity: LockEntity) -> AppResult<Vec<Lock>>;

    /// Insert a new lock.
    async fn insert_lock(&self, data: &CreateLock) -> AppResult<Lock>;

    /// Find a lock by ID.
    async fn find_lock(&self, id: LockId) -> AppResult<Option<Lock>>;

    /// Delete a lock. Returns `true` if it existed.
    async fn delete_lock(&self, id: LockId) -> AppResult<bool>;

    // ── Custom values ──────────────────────────────────────

    /// List the custom values of a folder, ordered by field.
    async fn custom_values(&self, folder_id: FolderId) -> AppResult<Vec<CustomValue>>;

    /// Store a custom value.
    async fn insert_custom_value(&self, data: &CreateCustomValue) -> AppResult<CustomValue>;

    // ── Projects ───────────────────────────────────────────

    /// Find a project by ID.
    async fn find_project(&self, id: ProjectId) -> AppResult<Option<Project>>;

    /// List projects with the document module enabled, ordered by name.
    async fn projects_with_module(&self) -> AppResult<Vec<Project>>;

    /// List the project memberships of a user.
    async fn memberships(&self, user_id: UserId) -> AppResult<Vec<Membership>>;
}
