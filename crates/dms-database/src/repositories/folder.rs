//! Folder repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use dms_core::error::{AppError, ErrorKind};
use dms_core::result::AppResult;
use dms_core::types::{FolderId, ProjectId};
use dms_entity::Visibility;
use dms_entity::folder::{CreateFolder, Folder};

use super::deleted_filter;
use crate::store::{DUPLICATE_TITLE_MESSAGE, DestroySummary};

/// Name of the partial unique index guarding active sibling titles.
const ACTIVE_TITLE_INDEX: &str = "folders_active_title_key";

/// Map a write failure, turning the title index violation into a
/// validation error.
fn map_write_error(e: sqlx::Error, context: &'static str) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.constraint() == Some(ACTIVE_TITLE_INDEX) => {
            AppError::validation(DUPLICATE_TITLE_MESSAGE)
        }
        _ => AppError::with_source(ErrorKind::Database, context, e),
    }
}

/// Repository for folder CRUD and subtree removal.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: PgPool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a folder by ID.
    pub async fn find_by_id(&self, id: FolderId) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    /// List direct children of `parent_id` (project root when `None`).
    pub async fn find_children(
        &self,
        project_id: ProjectId,
        parent_id: Option<FolderId>,
        scope: Visibility,
    ) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders \
             WHERE project_id = $1 AND parent_id IS NOT DISTINCT FROM $2 \
               AND ($3::smallint IS NULL OR deleted = $3) \
             ORDER BY title ASC",
        )
        .bind(project_id)
        .bind(parent_id)
        .bind(deleted_filter(scope))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list folders", e))
    }

    /// Find the active sibling titled `title`.
    pub async fn find_active_by_title(
        &self,
        project_id: ProjectId,
        parent_id: Option<FolderId>,
        title: &str,
    ) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders \
             WHERE project_id = $1 AND parent_id IS NOT DISTINCT FROM $2 \
               AND title = $3 AND deleted = 0",
        )
        .bind(project_id)
        .bind(parent_id)
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find folder by title", e)
        })
    }

    /// Create a new folder.
    pub async fn create(&self, data: &CreateFolder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (id, project_id, parent_id, title, description, user_id, notification) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(FolderId::new())
        .bind(data.project_id)
        .bind(data.parent_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.user_id)
        .bind(data.notification.as_option())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to create folder"))
    }

    /// Write every mutable column, guarded by the caller's `updated_at`.
    pub async fn update(&self, folder: &Folder) -> AppResult<Folder> {
        let updated = sqlx::query_as::<_, Folder>(
            "UPDATE folders SET parent_id = $2, title = $3, description = $4, deleted = $5, \
                 deleted_by_user_id = $6, notification = $7, \
                 updated_at = GREATEST(NOW(), $8 + INTERVAL '1 microsecond') \
             WHERE id = $1 AND updated_at = $8 RETURNING *",
        )
        .bind(folder.id)
        .bind(folder.parent_id)
        .bind(&folder.title)
        .bind(&folder.description)
        .bind(folder.deleted.as_i16())
        .bind(folder.deleted_by_user_id)
        .bind(folder.notification.as_option())
        .bind(folder.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to update folder"))?;

        match updated {
            Some(folder) => Ok(folder),
            None if self.find_by_id(folder.id).await?.is_some() => Err(AppError::conflict(
                format!("Folder {} was modified concurrently", folder.id),
            )),
            None => Err(AppError::not_found(format!("Folder {} not found", folder.id))),
        }
    }

    /// Remove a folder, its descendants, and everything attached to them in
    /// one transaction.
    pub async fn destroy(&self, folder: &Folder) -> AppResult<DestroySummary> {
        let db_err = |context: &'static str| {
            move |e: sqlx::Error| AppError::with_source(ErrorKind::Database, context, e)
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin transaction"))?;

        let current: Option<chrono::DateTime<chrono::Utc>> =
            sqlx::query_scalar("SELECT updated_at FROM folders WHERE id = $1 FOR UPDATE")
                .bind(folder.id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err("Failed to lock folder"))?;
        match current {
            None => return Err(AppError::not_found(format!("Folder {} not found", folder.id))),
            Some(at) if at != folder.updated_at => {
                return Err(AppError::conflict(format!(
                    "Folder {} was modified concurrently",
                    folder.id
                )));
            }
            Some(_) => {}
        }

        let folder_ids: Vec<Uuid> = sqlx::query_scalar(
            "WITH RECURSIVE subtree AS ( \
                SELECT id FROM folders WHERE id = $1 \
                UNION \
                SELECT f.id FROM folders f INNER JOIN subtree s ON f.parent_id = s.id \
             ) SELECT id FROM subtree",
        )
        .bind(folder.id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err("Failed to collect subtree"))?;

        let file_ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM files WHERE folder_id = ANY($1)")
            .bind(&folder_ids)
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err("Failed to collect files"))?;

        let links = sqlx::query(
            "DELETE FROM links WHERE folder_id = ANY($1) \
                OR target_folder_id = ANY($1) OR target_file_id = ANY($2)",
        )
        .bind(&folder_ids)
        .bind(&file_ids)
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to delete links"))?;

        let locks = sqlx::query(
            "DELETE FROM locks WHERE (entity_type = 1 AND entity_id = ANY($1)) \
                OR (entity_type = 0 AND entity_id = ANY($2))",
        )
        .bind(&folder_ids)
        .bind(&file_ids)
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to delete locks"))?;

        let custom_values = sqlx::query("DELETE FROM custom_values WHERE folder_id = ANY($1)")
            .bind(&folder_ids)
            .execute(&mut *tx)
            .await
            .map_err(db_err("Failed to delete custom values"))?;

        let files = sqlx::query("DELETE FROM files WHERE id = ANY($1)")
            .bind(&file_ids)
            .execute(&mut *tx)
            .await
            .map_err(db_err("Failed to delete files"))?;

        let folders = sqlx::query("DELETE FROM folders WHERE id = ANY($1)")
            .bind(&folder_ids)
            .execute(&mut *tx)
            .await
            .map_err(db_err("Failed to delete folders"))?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit folder destroy"))?;

        Ok(DestroySummary {
            folders: folders.rows_affected(),
            files: files.rows_affected(),
            links: links.rows_affected(),
            locks: locks.rows_affected(),
            custom_values: custom_values.rows_affected(),
        })
    }
}
