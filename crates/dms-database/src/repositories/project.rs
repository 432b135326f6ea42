//! Project and membership repository implementation.

use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use dms_core::error::{AppError, ErrorKind};
use dms_core::result::AppResult;
use dms_core::types::{ProjectId, UserId};
use dms_entity::project::{Membership, Project, Role};

/// Raw `members` row.
#[derive(Debug, FromRow)]
struct MemberRow {
    project_id: ProjectId,
    user_id: UserId,
    roles: Json<Vec<Role>>,
}

impl From<MemberRow> for Membership {
    fn from(row: MemberRow) -> Self {
        Self {
            project_id: row.project_id,
            user_id: row.user_id,
            roles: row.roles.0,
        }
    }
}

/// Repository for projects and their members.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    /// Create a new project repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a project by ID.
    pub async fn find_by_id(&self, id: ProjectId) -> AppResult<Option<Project>> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find project", e))
    }

    /// Projects with the document module enabled.
    pub async fn find_with_module(&self) -> AppResult<Vec<Project>> {
        sqlx::query_as::<_, Project>(
            "SELECT * FROM projects WHERE dms_enabled ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list projects", e))
    }

    /// Memberships of a user.
    pub async fn find_memberships(&self, user_id: UserId) -> AppResult<Vec<Membership>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            "SELECT project_id, user_id, roles FROM members WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list memberships", e))?;

        Ok(rows.into_iter().map(Membership::from).collect())
    }
}
