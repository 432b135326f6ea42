//! File repository implementation.

use sqlx::PgPool;

use dms_core::error::{AppError, ErrorKind};
use dms_core::result::AppResult;
use dms_core::types::{FileId, FolderId, ProjectId};
use dms_entity::Visibility;
use dms_entity::file::{CreateFile, DmsFile};

use super::deleted_filter;

/// Repository for file records.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a file by ID.
    pub async fn find_by_id(&self, id: FileId) -> AppResult<Option<DmsFile>> {
        sqlx::query_as::<_, DmsFile>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    /// List files held directly in a folder.
    pub async fn find_by_folder(
        &self,
        project_id: ProjectId,
        folder_id: Option<FolderId>,
        scope: Visibility,
    ) -> AppResult<Vec<DmsFile>> {
        sqlx::query_as::<_, DmsFile>(
            "SELECT * FROM files \
             WHERE project_id = $1 AND folder_id IS NOT DISTINCT FROM $2 \
               AND ($3::smallint IS NULL OR deleted = $3) \
             ORDER BY name ASC",
        )
        .bind(project_id)
        .bind(folder_id)
        .bind(deleted_filter(scope))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))
    }

    /// Create a file record.
    pub async fn create(&self, data: &CreateFile) -> AppResult<DmsFile> {
        sqlx::query_as::<_, DmsFile>(
            "INSERT INTO files (id, project_id, folder_id, name, description, size_bytes, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(FileId::new())
        .bind(data.project_id)
        .bind(data.folder_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.size_bytes)
        .bind(data.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create file", e))
    }
}
