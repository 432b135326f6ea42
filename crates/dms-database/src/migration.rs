//! Schema migration runner.

use sqlx::PgPool;
use tracing::info;

use dms_core::error::{AppError, ErrorKind};
use dms_core::result::AppResult;

/// Apply every pending migration under `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    info!("Running database migrations");

    let migrator = sqlx::migrate!("../../migrations");
    migrator.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Failed to run migrations: {e}"),
            e,
        )
    })?;

    info!(
        migrations = migrator.iter().count(),
        "Database migrations applied"
    );
    Ok(())
}
