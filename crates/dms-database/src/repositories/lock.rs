//! Lock repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use dms_core::error::{AppError, ErrorKind};
use dms_core::result::AppResult;
use dms_core::types::{LockId, UserId};
use dms_entity::lock::{CreateLock, Lock, LockEntity};

/// Raw `locks` row.
#[derive(Debug, FromRow)]
struct LockRow {
    id: LockId,
    entity_type: i16,
    entity_id: Uuid,
    user_id: UserId,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LockRow> for Lock {
    type Error = AppError;

    fn try_from(row: LockRow) -> Result<Self, Self::Error> {
        let entity = match row.entity_type {
            0 => LockEntity::File(row.entity_id.into()),
            1 => LockEntity::Folder(row.entity_id.into()),
            other => {
                return Err(AppError::internal(format!(
                    "Lock {} has unknown entity type {other}",
                    row.id
                )));
            }
        };
        Ok(Self {
            id: row.id,
            entity,
            user_id: row.user_id,
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for folder and file locks.
#[derive(Debug, Clone)]
pub struct LockRepository {
    pool: PgPool,
}

impl LockRepository {
    /// Create a new lock repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Every lock on an entity, most recent first.
    pub async fn find_by_entity(&self, entity: LockEntity) -> AppResult<Vec<Lock>> {
        let rows = sqlx::query_as::<_, LockRow>(
            "SELECT * FROM locks WHERE entity_type = $1 AND entity_id = $2 \
             ORDER BY updated_at DESC",
        )
        .bind(entity.type_code())
        .bind(entity.uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list locks", e))?;

        rows.into_iter().map(Lock::try_from).collect()
    }

    /// Find a lock by ID.
    pub async fn find_by_id(&self, id: LockId) -> AppResult<Option<Lock>> {
        sqlx::query_as::<_, LockRow>("SELECT * FROM locks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find lock", e))?
            .map(Lock::try_from)
            .transpose()
    }

    /// Take a lock.
    pub async fn create(&self, data: &CreateLock) -> AppResult<Lock> {
        let row = sqlx::query_as::<_, LockRow>(
            "INSERT INTO locks (id, entity_type, entity_id, user_id, expires_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(LockId::new())
        .bind(data.entity.type_code())
        .bind(data.entity.uuid())
        .bind(data.user_id)
        .bind(data.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create lock", e))?;

        Lock::try_from(row)
    }

    /// Release a lock.
    pub async fn delete(&self, id: LockId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM locks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete lock", e))?;
        Ok(result.rows_affected() > 0)
    }
}
