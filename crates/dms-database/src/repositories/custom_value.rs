//! Custom value repository implementation.

use sqlx::PgPool;

use dms_core::error::{AppError, ErrorKind};
use dms_core::result::AppResult;
use dms_core::types::{CustomValueId, FolderId};
use dms_entity::custom::{CreateCustomValue, CustomValue};

/// Repository for folder custom field values.
#[derive(Debug, Clone)]
pub struct CustomValueRepository {
    pool: PgPool,
}

impl CustomValueRepository {
    /// Create a new custom value repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Values attached to a folder, ordered by field.
    pub async fn find_by_folder(&self, folder_id: FolderId) -> AppResult<Vec<CustomValue>> {
        sqlx::query_as::<_, CustomValue>(
            "SELECT * FROM custom_values WHERE folder_id = $1 ORDER BY custom_field_id ASC",
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list custom values", e))
    }

    /// Store a value.
    pub async fn create(&self, data: &CreateCustomValue) -> AppResult<CustomValue> {
        sqlx::query_as::<_, CustomValue>(
            "INSERT INTO custom_values (id, custom_field_id, folder_id, value) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(CustomValueId::new())
        .bind(data.custom_field_id)
        .bind(data.folder_id)
        .bind(&data.value)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create custom value", e))
    }
}
