//! Deep copy of a folder subtree.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use dms_core::config::DmsConfig;
use dms_core::error::{AppError, ErrorKind};
use dms_core::result::AppResult;
use dms_core::types::{CustomValueId, FileId, FolderId, LinkId, ProjectId};
use dms_database::EntityStore;
use dms_entity::custom::CreateCustomValue;
use dms_entity::file::CreateFile;
use dms_entity::folder::{CreateFolder, Folder, NotificationSetting};
use dms_entity::link::{CreateLink, LinkKind};
use dms_entity::project::{Permission, Project};
use dms_entity::Visibility;

use crate::context::RequestContext;
use crate::guard::ProjectGuards;

use super::tree::TreeService;

/// Permissions a single role must grant for a project to accept copies.
const COPY_TARGET_PERMISSIONS: [Permission; 2] =
    [Permission::FolderManipulation, Permission::FileManipulation];

/// A source record the copy could not reproduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum CopyItem {
    /// A subfolder, and with it its whole branch.
    Folder(FolderId),
    /// A file.
    File(FileId),
    /// A link.
    Link(LinkId),
    /// A custom value.
    CustomValue(CustomValueId),
}

/// One failed step of a copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyFailure {
    /// The source record.
    pub item: CopyItem,
    /// Error category.
    pub kind: ErrorKind,
    /// Error message.
    pub message: String,
}

/// The result of a copy that created its root folder.
///
/// Failures below the root do not abort the copy; the failed branch is
/// skipped and listed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyReport {
    /// The new root folder.
    pub folder: Folder,
    /// Folders created, the root included.
    pub folders: u64,
    /// Files copied.
    pub files: u64,
    /// Links copied.
    pub links: u64,
    /// Custom values cloned.
    pub custom_values: u64,
    /// Steps that failed.
    pub failures: Vec<CopyFailure>,
}

impl CopyReport {
    fn new(folder: Folder) -> Self {
        Self {
            folder,
            folders: 1,
            files: 0,
            links: 0,
            custom_values: 0,
            failures: Vec::new(),
        }
    }

    /// Whether every source record was copied.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, item: CopyItem, error: AppError) {
        warn!(?item, error = %error, "Copy step failed");
        self.failures.push(CopyFailure {
            item,
            kind: error.kind,
            message: error.message,
        });
    }
}

/// A folder whose files are copied and whose subfolders are being copied
/// one at a time, in title order. Its links follow the last subfolder.
struct CopyFrame {
    from: Folder,
    to: Folder,
    depth: usize,
    children: std::vec::IntoIter<Folder>,
}

/// Copies folders, with their files, links, and custom values, to another
/// location.
#[derive(Debug, Clone)]
pub struct CopyService {
    store: Arc<dyn EntityStore>,
    tree: TreeService,
    guards: ProjectGuards,
    default_notifications: bool,
}

impl CopyService {
    /// Creates a new copy service.
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

    fn notification(&self) -> NotificationSetting {
        if self.default_notifications {
            NotificationSetting::On
        } else {
            NotificationSetting::Inherit
        }
    }

    /// Projects the actor may copy folders into.
    ///
    /// Admins may use every project with the module enabled; members need
    /// one role granting both folder and file manipulation.
    pub async fn allowed_target_projects(&self, ctx: &RequestContext) -> AppResult<Vec<Project>> {
        if ctx.is_admin() {
            return self.store.projects_with_module().await;
        }
        if !ctx.role.is_logged() {
            return Ok(Vec::new());
        }

        let mut projects = Vec::new();
        for membership in self.store.memberships(ctx.user_id).await? {
            if !membership.any_role_allows_all(&COPY_TARGET_PERMISSIONS) {
                continue;
            }
            if let Some(project) = self.store.find_project(membership.project_id).await? {
                if project.dms_enabled {
                    projects.push(project);
                }
            }
        }
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    /// Copies `folder_id` under `destination_parent`, or to the root of
    /// `destination_project` when no parent is given.
    ///
    /// The parent's project wins over `destination_project`. Everything
    /// created is owned by the actor. An error is returned only when the
    /// new root folder cannot be created.
    pub async fn copy_to(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        destination_project: ProjectId,
        destination_parent: Option<FolderId>,
    ) -> AppResult<CopyReport> {
        let source = self
            .store
            .find_folder(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))?;

        let project_id = match destination_parent {
            Some(parent_id) => {
                let parent = self
                    .store
                    .find_folder(parent_id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Folder {parent_id} not found")))?;
                if parent.is_deleted() {
                    return Err(AppError::validation("Destination folder is deleted"));
                }
                parent.project_id
            }
            None => {
                self.store
                    .find_project(destination_project)
                    .await?
                    .ok_or_else(|| {
                        AppError::not_found(format!("Project {destination_project} not found"))
                    })?
                    .id
            }
        };

        let _guard = self.guards.acquire(project_id).await;

        let root_data = CreateFolder {
            project_id,
            parent_id: destination_parent,
            title: source.title.clone(),
            description: source.description.clone(),
            user_id: ctx.user_id,
            notification: self.notification(),
        };
        self.tree
            .validate_candidate(project_id, destination_parent, &root_data.title, None)
            .await?;
        let root = self.store.insert_folder(&root_data).await?;

        let mut report = CopyReport::new(root.clone());
        self.copy_custom_values(source.id, root.id, &mut report).await;

        let mut created = HashSet::from([root.id]);
        let mut stack: Vec<CopyFrame> = self
            .enter(ctx, source, root, 0, &mut report)
            .await
            .into_iter()
            .collect();

        while let Some(frame) = stack.last_mut() {
            let Some(child) = frame.children.next() else {
                if let Some(done) = stack.pop() {
                    self.copy_links(ctx, &done.from, &done.to, &mut report).await;
                }
                continue;
            };
            if created.contains(&child.id) {
                continue;
            }

            let depth = frame.depth + 1;
            let copy = CreateFolder {
                project_id: frame.to.project_id,
                parent_id: Some(frame.to.id),
                title: child.title.clone(),
                description: child.description.clone(),
                user_id: ctx.user_id,
                notification: self.notification(),
            };
            match self.store.insert_folder(&copy).await {
                Ok(new_child) => {
                    report.folders += 1;
                    created.insert(new_child.id);
                    self.copy_custom_values(child.id, new_child.id, &mut report).await;
                    if let Some(next) =
                        self.enter(ctx, child, new_child, depth, &mut report).await
                    {
                        stack.push(next);
                    }
                }
                Err(e) => report.fail(CopyItem::Folder(child.id), e),
            }
        }

        info!(
            user_id = %ctx.user_id,
            source_id = %folder_id,
            folder_id = %report.folder.id,
            folders = report.folders,
            files = report.files,
            links = report.links,
            failures = report.failures.len(),
            "Folder copied"
        );

        Ok(report)
    }

    /// Starts copying into `to`: copies the files of `from` and returns the
    /// frame that walks its subfolders, or `None` past the depth limit.
    async fn enter(
        &self,
        ctx: &RequestContext,
        from: Folder,
        to: Folder,
        depth: usize,
        report: &mut CopyReport,
    ) -> Option<CopyFrame> {
        if depth > self.tree.max_depth() {
            report.fail(
                CopyItem::Folder(from.id),
                AppError::validation(format!(
                    "Folder tree exceeds the maximum depth of {}",
                    self.tree.max_depth()
                )),
            );
            return None;
        }

        self.copy_files(ctx, &from, &to, report).await;

        let mut children = match self
            .store
            .child_folders(from.project_id, Some(from.id), Visibility::Active)
            .await
        {
            Ok(children) => children,
            Err(e) => {
                report.fail(CopyItem::Folder(from.id), e);
                Vec::new()
            }
        };
        children.sort_by(|a, b| a.title.cmp(&b.title));

        Some(CopyFrame {
            from,
            to,
            depth,
            children: children.into_iter(),
        })
    }

    async fn copy_files(
        &self,
        ctx: &RequestContext,
        from: &Folder,
        to: &Folder,
        report: &mut CopyReport,
    ) {
        let files = match self
            .store
            .folder_files(from.project_id, Some(from.id), Visibility::Active)
            .await
        {
            Ok(files) => files,
            Err(e) => {
                report.fail(CopyItem::Folder(from.id), e);
                return;
            }
        };
        for file in files {
            let copy = CreateFile {
                project_id: to.project_id,
                folder_id: Some(to.id),
                name: file.name.clone(),
                description: file.description.clone(),
                size_bytes: file.size_bytes,
                user_id: ctx.user_id,
            };
            match self.store.insert_file(&copy).await {
                Ok(_) => report.files += 1,
                Err(e) => report.fail(CopyItem::File(file.id), e),
            }
        }
    }

    /// Copies folder links, then file links, then URL links.
    async fn copy_links(
        &self,
        ctx: &RequestContext,
        from: &Folder,
        to: &Folder,
        report: &mut CopyReport,
    ) {
        for kind in [LinkKind::Folder, LinkKind::File, LinkKind::Url] {
            let links = match self
                .store
                .folder_links(from.project_id, Some(from.id), kind, Visibility::Active)
                .await
            {
                Ok(links) => links,
                Err(e) => {
                    report.fail(CopyItem::Folder(from.id), e);
                    continue;
                }
            };
            for link in links {
                let copy = CreateLink {
                    project_id: to.project_id,
                    folder_id: Some(to.id),
                    target: link.target.clone(),
                    name: link.name.clone(),
                    user_id: ctx.user_id,
                };
                match self.store.insert_link(&copy).await {
                    Ok(_) => report.links += 1,
                    Err(e) => report.fail(CopyItem::Link(link.id), e),
                }
            }
        }
    }

    async fn copy_custom_values(&self, from: FolderId, to: FolderId, report: &mut CopyReport) {
        let values = match self.store.custom_values(from).await {
            Ok(values) => values,
            Err(e) => {
                report.fail(CopyItem::Folder(from), e);
                return;
            }
        };
        for value in values {
            let copy = CreateCustomValue {
                custom_field_id: value.custom_field_id,
                folder_id: to,
                value: value.value.clone(),
            };
            match self.store.insert_custom_value(&copy).await {
                Ok(_) => report.custom_values += 1,
                Err(e) => report.fail(CopyItem::CustomValue(value.id), e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use dms_core::types::{CustomFieldId, UserId};
    use dms_entity::link::LinkTarget;
    use dms_entity::project::{Membership, Role};
    use dms_entity::user::UserRole;

    #[tokio::test]
    async fn test_copy_preserves_structure() {
        let fx = Fixture::new().await;
        let a = fx.folder(None, "A").await;
        fx.file(&a, "a.pdf", 10).await;
        let sub = fx.folder(Some(&a), "Sub").await;
        fx.file(&sub, "sub.pdf", 5).await;
        let d = fx.folder(None, "D").await;

        let copier_ctx = RequestContext::member(UserId::new());
        let report = fx
            .copier()
            .copy_to(&copier_ctx, a.id, fx.project.id, Some(d.id))
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.folders, 2);
        assert_eq!(report.files, 2);
        assert_eq!(report.folder.parent_id, Some(d.id));
        assert_eq!(report.folder.user_id, copier_ctx.user_id);

        let stats = fx.tree().deep_stats(&report.folder).await.unwrap();
        assert_eq!(stats.file_count, 2);
        assert_eq!(stats.folder_count, 1);
        assert_eq!(stats.size_bytes, 15);

        let copied_sub = fx
            .tree()
            .find_by_title(fx.project.id, Some(report.folder.id), "Sub")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(copied_sub.user_id, copier_ctx.user_id);
        let files = fx
            .store
            .folder_files(fx.project.id, Some(copied_sub.id), Visibility::Active)
            .await
            .unwrap();
        assert_eq!(files[0].user_id, copier_ctx.user_id);
    }

    #[tokio::test]
    async fn test_copy_finishes_each_branch_in_title_order() {
        let fx = Fixture::new().await;
        let a = fx.folder(None, "A").await;
        let zeta = fx.folder(Some(&a), "Zeta").await;
        fx.folder(Some(&zeta), "Z1").await;
        let alpha = fx.folder(Some(&a), "Alpha").await;
        fx.folder(Some(&alpha), "A1").await;
        let d = fx.folder(None, "D").await;
        fx.cache.clear();

        let report = fx
            .copier()
            .copy_to(&fx.ctx, a.id, fx.project.id, Some(d.id))
            .await
            .unwrap();
        assert_eq!(report.folders, 5);

        let project = fx.project.id;
        let tree = fx.tree();
        let new_alpha = tree
            .find_by_title(project, Some(report.folder.id), "Alpha")
            .await
            .unwrap()
            .unwrap();
        let new_zeta = tree
            .find_by_title(project, Some(report.folder.id), "Zeta")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            fx.cache.keys(),
            vec![
                format!("PROPFIND/{project}/{}", d.id),
                format!("PROPFIND/{project}/{}", report.folder.id),
                format!("PROPFIND/{project}/{}", new_alpha.id),
                format!("PROPFIND/{project}/{}", report.folder.id),
                format!("PROPFIND/{project}/{}", new_zeta.id),
            ]
        );
    }

    #[tokio::test]
    async fn test_custom_values_cloned_by_value() {
        let fx = Fixture::new().await;
        let a = fx.folder(None, "A").await;
        let field = CustomFieldId::new();
        let original = fx
            .store
            .insert_custom_value(&CreateCustomValue {
                custom_field_id: field,
                folder_id: a.id,
                value: Some("Contract".to_string()),
            })
            .await
            .unwrap();
        let d = fx.folder(None, "D").await;

        let report = fx
            .copier()
            .copy_to(&fx.ctx, a.id, fx.project.id, Some(d.id))
            .await
            .unwrap();

        let copied = fx.store.custom_values(report.folder.id).await.unwrap();
        assert_eq!(copied.len(), 1);
        assert_ne!(copied[0].id, original.id);
        assert_eq!(copied[0].custom_field_id, field);
        assert_eq!(copied[0].value.as_deref(), Some("Contract"));
        assert_eq!(fx.store.custom_values(a.id).await.unwrap(), vec![original]);
    }

    #[tokio::test]
    async fn test_copy_skips_deleted_and_keeps_links() {
        let fx = Fixture::new().await;
        let a = fx.folder(None, "A").await;
        let gone = fx.file(&a, "gone.pdf", 1).await;
        fx.memory
            .set_file_state(gone.id, dms_entity::DeletedState::Deleted)
            .await
            .unwrap();
        let target = fx.folder(None, "Target").await;
        fx.link(&a, LinkTarget::Folder(target.id), "to target").await;
        fx.link(&a, LinkTarget::Url("https://example.com".into()), "site").await;

        let report = fx
            .copier()
            .copy_to(&fx.ctx, a.id, fx.project.id, Some(target.id))
            .await
            .unwrap();
        assert_eq!(report.files, 0);
        assert_eq!(report.links, 2);

        let links = fx
            .store
            .folder_links(fx.project.id, Some(report.folder.id), LinkKind::Folder, Visibility::Active)
            .await
            .unwrap();
        assert_eq!(links[0].target, LinkTarget::Folder(target.id));
    }

    #[tokio::test]
    async fn test_copy_into_own_subtree_terminates() {
        let fx = Fixture::new().await;
        let a = fx.folder(None, "A").await;
        let b = fx.folder(Some(&a), "B").await;

        let report = fx
            .copier()
            .copy_to(&fx.ctx, a.id, fx.project.id, Some(b.id))
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.folders, 2);
        assert_eq!(report.folder.parent_id, Some(b.id));
    }

    #[tokio::test]
    async fn test_copy_root_collision_returns_validation_error() {
        let fx = Fixture::new().await;
        let a = fx.folder(None, "A").await;

        let err = fx
            .copier()
            .copy_to(&fx.ctx, a.id, fx.project.id, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_copy_to_other_project_root() {
        let fx = Fixture::new().await;
        let other = Project {
            id: ProjectId::new(),
            name: "Beta".to_string(),
            notification_default: false,
            dms_enabled: true,
        };
        fx.memory.insert_project(other.clone()).await;
        let a = fx.folder(None, "A").await;

        let report = fx
            .copier()
            .copy_to(&fx.ctx, a.id, other.id, None)
            .await
            .unwrap();
        assert_eq!(report.folder.project_id, other.id);
        assert_eq!(report.folder.parent_id, None);
    }

    #[tokio::test]
    async fn test_allowed_target_projects() {
        let fx = Fixture::new().await;
        let disabled = Project {
            id: ProjectId::new(),
            name: "Disabled".to_string(),
            notification_default: false,
            dms_enabled: false,
        };
        fx.memory.insert_project(disabled.clone()).await;

        let manager = Role {
            name: "Manager".to_string(),
            permissions: vec![Permission::FolderManipulation, Permission::FileManipulation],
        };
        for project_id in [fx.project.id, disabled.id] {
            fx.memory
                .insert_membership(Membership {
                    project_id,
                    user_id: fx.ctx.user_id,
                    roles: vec![manager.clone()],
                })
                .await;
        }
        let copier = fx.copier();

        let projects = copier.allowed_target_projects(&fx.ctx).await.unwrap();
        assert_eq!(projects, vec![fx.project.clone()]);

        let reader = RequestContext::member(UserId::new());
        fx.memory
            .insert_membership(Membership {
                project_id: fx.project.id,
                user_id: reader.user_id,
                roles: vec![Role {
                    name: "Reader".to_string(),
                    permissions: vec![Permission::ViewFiles, Permission::FolderManipulation],
                }],
            })
            .await;
        assert!(copier.allowed_target_projects(&reader).await.unwrap().is_empty());

        let admin = RequestContext::admin(UserId::new());
        assert_eq!(copier.allowed_target_projects(&admin).await.unwrap().len(), 1);

        let anonymous = RequestContext::new(UserId::new(), UserRole::Anonymous);
        assert!(copier.allowed_target_projects(&anonymous).await.unwrap().is_empty());
    }
}
