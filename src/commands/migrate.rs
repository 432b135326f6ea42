//! Database migration management commands.

use clap::{Args, Subcommand};

use crate::output;
use dms_core::config::AppConfig;
use dms_core::error::AppError;
use dms_database::DatabasePool;
use dms_database::migration::run_migrations;

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Run all pending migrations
    Run,
}

/// Execute migration commands
pub async fn execute(args: &MigrateArgs, config: &AppConfig) -> Result<(), AppError> {
    if config.database.provider != "postgres" {
        return Err(AppError::configuration(
            "Migrations need database.provider = \"postgres\"",
        ));
    }

    match &args.command {
        MigrateCommand::Run => {
            let pool = DatabasePool::connect(&config.database).await?;
            println!("Running database migrations...");
            let result = run_migrations(pool.pool()).await;
            pool.close().await;
            result?;
            output::print_success("All migrations applied successfully.");
        }
    }

    Ok(())
}
