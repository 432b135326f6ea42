//! Link repository implementation.
//!
//! Link targets are polymorphic; rows carry a `target_type` discriminator
//! plus one populated target column and are converted into [`Link`].

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use dms_core::error::{AppError, ErrorKind};
use dms_core::result::AppResult;
use dms_core::types::{FolderId, LinkId, ProjectId, UserId};
use dms_entity::link::{CreateLink, Link, LinkKind, LinkTarget};
use dms_entity::{DeletedState, Visibility};

use super::deleted_filter;

/// Raw `links` row.
#[derive(Debug, FromRow)]
struct LinkRow {
    id: LinkId,
    project_id: ProjectId,
    folder_id: Option<FolderId>,
    target_type: String,
    target_folder_id: Option<Uuid>,
    target_file_id: Option<Uuid>,
    external_url: Option<String>,
    name: String,
    deleted: i16,
    user_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LinkRow> for Link {
    type Error = AppError;

    fn try_from(row: LinkRow) -> Result<Self, Self::Error> {
        let missing = || AppError::internal(format!("Link {} has no target", row.id));
        let target = match row.target_type.parse::<LinkKind>()? {
            LinkKind::Folder => LinkTarget::Folder(row.target_folder_id.ok_or_else(missing)?.into()),
            LinkKind::File => LinkTarget::File(row.target_file_id.ok_or_else(missing)?.into()),
            LinkKind::Url => LinkTarget::Url(row.external_url.clone().ok_or_else(missing)?),
        };
        Ok(Self {
            id: row.id,
            project_id: row.project_id,
            folder_id: row.folder_id,
            target,
            name: row.name,
            deleted: DeletedState::try_from(row.deleted)?,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for folder, file, and URL links.
#[derive(Debug, Clone)]
pub struct LinkRepository {
    pool: PgPool,
}

impl LinkRepository {
    /// Create a new link repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List links of one kind held directly in a folder.
    pub async fn find_by_folder(
        &self,
        project_id: ProjectId,
        folder_id: Option<FolderId>,
        kind: LinkKind,
        scope: Visibility,
    ) -> AppResult<Vec<Link>> {
        let rows = sqlx::query_as::<_, LinkRow>(
            "SELECT * FROM links \
             WHERE project_id = $1 AND folder_id IS NOT DISTINCT FROM $2 AND target_type = $3 \
               AND ($4::smallint IS NULL OR deleted = $4) \
             ORDER BY name ASC",
        )
        .bind(project_id)
        .bind(folder_id)
        .bind(kind.as_str())
        .bind(deleted_filter(scope))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list links", e))?;

        rows.into_iter().map(Link::try_from).collect()
    }

    /// Create a link.
    pub async fn create(&self, data: &CreateLink) -> AppResult<Link> {
        let (folder_target, file_target, url) = match &data.target {
            LinkTarget::Folder(id) => (Some(id.into_uuid()), None, None),
            LinkTarget::File(id) => (None, Some(id.into_uuid()), None),
            LinkTarget::Url(url) => (None, None, Some(url.as_str())),
        };

        let row = sqlx::query_as::<_, LinkRow>(
            "INSERT INTO links (id, project_id, folder_id, target_type, target_folder_id, \
                 target_file_id, external_url, name, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(LinkId::new())
        .bind(data.project_id)
        .bind(data.folder_id)
        .bind(data.target.kind().as_str())
        .bind(folder_target)
        .bind(file_target)
        .bind(url)
        .bind(&data.name)
        .bind(data.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create link", e))?;

        Link::try_from(row)
    }
}
