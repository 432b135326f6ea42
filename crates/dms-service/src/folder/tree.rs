//! Tree integrity checks, paths, and deep aggregates.
//!
//! Folder depth is user-controlled, so every walk here keeps an explicit
//! work stack and stops with a validation error past the configured
//! maximum depth instead of recursing.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use dms_core::config::DmsConfig;
use dms_core::error::AppError;
use dms_core::result::AppResult;
use dms_core::types::{FolderId, ProjectId};
use dms_database::{DUPLICATE_TITLE_MESSAGE, EntityStore};
use dms_entity::Visibility;
use dms_entity::folder::{DirectoryEntry, Folder, FolderStats, title_has_invalid_character};
use dms_entity::link::LinkKind;

/// Validates folder placement and computes derived tree properties.
#[derive(Debug, Clone)]
pub struct TreeService {
    store: Arc<dyn EntityStore>,
    max_depth: usize,
    root_label: String,
}

impl TreeService {
    /// Creates a new tree service.
    pub fn new(store: Arc<dyn EntityStore>, config: &DmsConfig) -> Self {
        Self {
            store,
            max_depth: config.max_tree_depth,
            root_label: config.root_label.clone(),
        }
    }

    /// The deepest level a walk may reach.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn too_deep(&self) -> AppError {
        AppError::validation(format!(
            "Folder tree exceeds the maximum depth of {}",
            self.max_depth
        ))
    }

    // ── Validation ─────────────────────────────────────────

    /// Checks the title of `folder` as it is about to be persisted.
    pub async fn validate_title(&self, folder: &Folder) -> AppResult<()> {
        self.validate_candidate(folder.project_id, folder.parent_id, &folder.title, Some(folder.id))
            .await
    }

    /// Checks `title` for a folder placed under `parent_id`, ignoring the
    /// folder `except` when looking for duplicates.
    ///
    /// Every problem found is reported in the error's details.
    pub async fn validate_candidate(
        &self,
        project_id: ProjectId,
        parent_id: Option<FolderId>,
        title: &str,
        except: Option<FolderId>,
    ) -> AppResult<()> {
        let mut problems = Vec::new();

        if title.trim().is_empty() {
            problems.push("Title cannot be empty".to_string());
        } else {
            if title_has_invalid_character(title) {
                problems.push("Title contains invalid characters".to_string());
            }
            let taken = self
                .store
                .find_active_by_title(project_id, parent_id, title)
                .await?
                .is_some_and(|existing| Some(existing.id) != except);
            if taken {
                problems.push(DUPLICATE_TITLE_MESSAGE.to_string());
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation_errors(problems))
        }
    }

    /// Rejects making `proposed_parent` the parent of `folder` when that
    /// parent is the folder itself or lies anywhere in its subtree.
    pub async fn check_cycle(
        &self,
        folder: &Folder,
        proposed_parent: Option<FolderId>,
    ) -> AppResult<()> {
        let mut visited = HashSet::new();
        let mut current = proposed_parent;

        while let Some(id) = current {
            if id == folder.id {
                return Err(AppError::validation(
                    "A folder cannot be moved into itself or one of its subfolders (cycle)",
                ));
            }
            if !visited.insert(id) || visited.len() > self.max_depth {
                return Err(self.too_deep());
            }
            let ancestor = self
                .store
                .find_folder(id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;
            current = ancestor.parent_id;
        }

        Ok(())
    }

    // ── Paths ──────────────────────────────────────────────

    /// The chain of folders from the project root down to `folder`,
    /// inclusive.
    pub async fn path_of(&self, folder: &Folder) -> AppResult<Vec<Folder>> {
        let mut path = vec![folder.clone()];
        let mut current = folder.parent_id;

        while let Some(id) = current {
            if path.len() > self.max_depth {
                return Err(self.too_deep());
            }
            let Some(parent) = self.store.find_folder(id).await? else {
                break;
            };
            current = parent.parent_id;
            path.push(parent);
        }

        path.reverse();
        Ok(path)
    }

    /// The titles of [`path_of`](Self::path_of) joined with `/`.
    pub async fn path_str(&self, folder: &Folder) -> AppResult<String> {
        let path = self.path_of(folder).await?;
        Ok(path
            .iter()
            .map(|f| f.title.as_str())
            .collect::<Vec<_>>()
            .join("/"))
    }

    // ── Aggregates ─────────────────────────────────────────

    /// Counts and sizes over the visible subtree of `folder`.
    ///
    /// A deleted subfolder hides everything beneath it, whatever the state
    /// of its own children.
    pub async fn deep_stats(&self, folder: &Folder) -> AppResult<FolderStats> {
        let mut stats = FolderStats::default();
        let mut stack = vec![(folder.id, 0usize)];

        while let Some((folder_id, depth)) = stack.pop() {
            if depth > self.max_depth {
                return Err(self.too_deep());
            }
            let scope = Some(folder_id);
            let project = folder.project_id;

            let files = self
                .store
                .folder_files(project, scope, Visibility::Active)
                .await?;
            stats.file_count += files.len() as u64;
            stats.size_bytes += files
                .iter()
                .map(|f| u64::try_from(f.size_bytes).unwrap_or(0))
                .sum::<u64>();

            for kind in [LinkKind::File, LinkKind::Url] {
                let links = self
                    .store
                    .folder_links(project, scope, kind, Visibility::Active)
                    .await?;
                stats.file_count += links.len() as u64;
            }

            let folder_links = self
                .store
                .folder_links(project, scope, LinkKind::Folder, Visibility::Active)
                .await?;
            stats.folder_count += folder_links.len() as u64;

            let children = self
                .store
                .child_folders(project, scope, Visibility::Active)
                .await?;
            stats.folder_count += children.len() as u64;
            stack.extend(children.into_iter().map(|child| (child.id, depth + 1)));
        }

        Ok(stats)
    }

    /// Visible files, file links, and URL links in the subtree.
    pub async fn deep_file_count(&self, folder: &Folder) -> AppResult<u64> {
        Ok(self.deep_stats(folder).await?.file_count)
    }

    /// Visible subfolders and folder links in the subtree.
    pub async fn deep_folder_count(&self, folder: &Folder) -> AppResult<u64> {
        Ok(self.deep_stats(folder).await?.folder_count)
    }

    /// Total size of the visible files in the subtree.
    pub async fn deep_size(&self, folder: &Folder) -> AppResult<u64> {
        Ok(self.deep_stats(folder).await?.size_bytes)
    }

    /// The latest update among the folder and its direct children, deleted
    /// or not.
    pub async fn last_modified(&self, folder: &Folder) -> AppResult<DateTime<Utc>> {
        let project = folder.project_id;
        let scope = Some(folder.id);
        let mut latest = folder.updated_at;

        for child in self
            .store
            .child_folders(project, scope, Visibility::All)
            .await?
        {
            latest = latest.max(child.updated_at);
        }
        for file in self.store.folder_files(project, scope, Visibility::All).await? {
            latest = latest.max(file.updated_at);
        }
        for kind in LinkKind::ALL {
            for link in self
                .store
                .folder_links(project, scope, kind, Visibility::All)
                .await?
            {
                latest = latest.max(link.updated_at);
            }
        }

        Ok(latest)
    }

    /// Visible direct subfolders, files, and links.
    pub async fn item_count(&self, folder: &Folder) -> AppResult<u64> {
        let project = folder.project_id;
        let scope = Some(folder.id);

        let mut count = self
            .store
            .child_folders(project, scope, Visibility::Active)
            .await?
            .len();
        count += self
            .store
            .folder_files(project, scope, Visibility::Active)
            .await?
            .len();
        for kind in LinkKind::ALL {
            count += self
                .store
                .folder_links(project, scope, kind, Visibility::Active)
                .await?
                .len();
        }

        Ok(count as u64)
    }

    // ── Lookup & select trees ──────────────────────────────

    /// The active folder titled `title` directly under `parent_id`.
    pub async fn find_by_title(
        &self,
        project_id: ProjectId,
        parent_id: Option<FolderId>,
        title: &str,
    ) -> AppResult<Option<Folder>> {
        self.store
            .find_active_by_title(project_id, parent_id, title)
            .await
    }

    /// Every visible folder of the project as indented select entries,
    /// headed by the project root. `current_folder` and its subtree are
    /// left out so they cannot be chosen as their own destination.
    pub async fn directory_tree(
        &self,
        project_id: ProjectId,
        current_folder: Option<FolderId>,
    ) -> AppResult<Vec<DirectoryEntry>> {
        let mut tree = vec![DirectoryEntry::new(self.root_label.clone(), None)];
        let roots = self
            .store
            .child_folders(project_id, None, Visibility::Active)
            .await?;
        self.push_subtrees(&mut tree, project_id, roots, 1, current_folder)
            .await?;
        Ok(tree)
    }

    /// `folder` followed by its visible subtree as indented select entries.
    pub async fn folder_tree(&self, folder: &Folder) -> AppResult<Vec<DirectoryEntry>> {
        let mut tree = vec![DirectoryEntry::new(folder.title.clone(), Some(folder.id))];
        let children = self
            .store
            .child_folders(folder.project_id, Some(folder.id), Visibility::Active)
            .await?;
        self.push_subtrees(&mut tree, folder.project_id, children, 2, None)
            .await?;
        Ok(tree)
    }

    /// Appends `folders` (at `level`) and their visible descendants in
    /// pre-order, title order among siblings.
    async fn push_subtrees(
        &self,
        tree: &mut Vec<DirectoryEntry>,
        project_id: ProjectId,
        folders: Vec<Folder>,
        level: usize,
        skip: Option<FolderId>,
    ) -> AppResult<()> {
        let mut stack: Vec<(Folder, usize)> =
            folders.into_iter().rev().map(|f| (f, level)).collect();

        while let Some((folder, level)) = stack.pop() {
            if Some(folder.id) == skip {
                continue;
            }
            if level > self.max_depth {
                return Err(self.too_deep());
            }
            tree.push(DirectoryEntry::new(
                format!("{}{}", "...".repeat(level), folder.title),
                Some(folder.id),
            ));
            let children = self
                .store
                .child_folders(project_id, Some(folder.id), Visibility::Active)
                .await?;
            stack.extend(children.into_iter().rev().map(|c| (c, level + 1)));
        }

        Ok(())
    }
}
