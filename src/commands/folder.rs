//! Folder management CLI commands.

use chrono::{Duration, Utc};
use clap::{Args, Subcommand, ValueEnum};

use crate::output::{self, EntryRow, FolderRow, OutputFormat, ProjectRow};
use dms::App;
use dms_core::config::AppConfig;
use dms_core::error::AppError;
use dms_core::types::{FileId, FolderId, LockId, ProjectId, UserId};
use dms_entity::folder::NotificationSetting;
use dms_service::{DeleteOutcome, RequestContext};

/// Arguments for folder commands
#[derive(Debug, Args)]
pub struct FolderArgs {
    /// Acting user
    #[command(flatten)]
    pub actor: ActorArgs,
    /// Folder subcommand
    #[command(subcommand)]
    pub command: FolderCommand,
}

/// The user a command acts as
#[derive(Debug, Args)]
pub struct ActorArgs {
    /// User ID stamped on created and changed records
    #[arg(long = "as-user", global = true)]
    pub as_user: Option<UserId>,
    /// Act with administrator rights
    #[arg(long, global = true)]
    pub admin: bool,
}

impl ActorArgs {
    fn context(&self) -> Result<RequestContext, AppError> {
        let user_id = self
            .as_user
            .ok_or_else(|| AppError::validation("--as-user is required for this command"))?;
        Ok(if self.admin {
            RequestContext::admin(user_id)
        } else {
            RequestContext::member(user_id)
        })
    }
}

/// Notification override values
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum NotifyArg {
    /// Always notify
    On,
    /// Never notify
    Off,
    /// Follow the parent folder or project
    Inherit,
}

impl From<NotifyArg> for NotificationSetting {
    fn from(arg: NotifyArg) -> Self {
        match arg {
            NotifyArg::On => Self::On,
            NotifyArg::Off => Self::Off,
            NotifyArg::Inherit => Self::Inherit,
        }
    }
}

/// Folder subcommands
#[derive(Debug, Subcommand)]
pub enum FolderCommand {
    /// List the visible folders under a parent
    List {
        /// Project ID
        #[arg(short, long)]
        project: ProjectId,
        /// Parent folder ID (omit for the project root)
        #[arg(long)]
        parent: Option<FolderId>,
    },
    /// Create a new folder
    Create {
        /// Project ID
        #[arg(short, long)]
        project: ProjectId,
        /// Folder title
        #[arg(short, long)]
        title: String,
        /// Parent folder ID (omit for the project root)
        #[arg(long)]
        parent: Option<FolderId>,
        /// Description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Rename a folder
    Rename {
        /// Folder ID
        id: FolderId,
        /// New title
        #[arg(short, long)]
        title: String,
    },
    /// Replace a folder's description
    Describe {
        /// Folder ID
        id: FolderId,
        /// New description (omit to clear)
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Move a folder under another parent
    Move {
        /// Folder ID
        id: FolderId,
        /// New parent folder ID (omit for the project root)
        #[arg(long)]
        parent: Option<FolderId>,
    },
    /// Delete an empty folder
    Delete {
        /// Folder ID
        id: FolderId,
        /// Remove the folder and its hidden subtree for good
        #[arg(long)]
        permanent: bool,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Restore a soft-deleted folder
    Restore {
        /// Folder ID
        id: FolderId,
    },
    /// Copy a folder and its contents
    Copy {
        /// Folder ID
        id: FolderId,
        /// Destination project ID
        #[arg(short, long)]
        project: ProjectId,
        /// Destination parent folder ID (omit for the project root)
        #[arg(long)]
        parent: Option<FolderId>,
    },
    /// List the projects the actor may copy into
    Targets,
    /// Show a directory tree
    Tree {
        /// Project ID
        #[arg(short, long)]
        project: ProjectId,
        /// Show only this folder's subtree
        #[arg(long, conflicts_with = "exclude")]
        folder: Option<FolderId>,
        /// Leave this folder and its subtree out
        #[arg(long)]
        exclude: Option<FolderId>,
    },
    /// Show deep counts and sizes of a folder
    Stats {
        /// Folder ID
        id: FolderId,
    },
    /// Show the path of a folder
    Path {
        /// Folder ID
        id: FolderId,
    },
    /// Change a folder's notification setting
    Notify {
        /// Folder ID
        id: FolderId,
        /// New setting
        #[arg(value_enum)]
        setting: NotifyArg,
    },
    /// Lock a folder or a file
    Lock {
        /// Folder ID
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        id: Option<FolderId>,
        /// Lock this file instead of a folder
        #[arg(long)]
        file: Option<FileId>,
        /// Minutes until the lock expires (omit for no expiry)
        #[arg(long)]
        minutes: Option<i64>,
    },
    /// Release a lock
    Unlock {
        /// Lock ID
        lock_id: LockId,
    },
}

/// Execute folder commands
pub async fn execute(
    args: &FolderArgs,
    config: AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let app = App::build(config).await?;
    let result = run(&app, args, format).await;
    app.shutdown().await;
    result
}

async fn run(app: &App, args: &FolderArgs, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        FolderCommand::List { project, parent } => {
            let folders = app.folders.list_children(*project, *parent).await?;
            let rows: Vec<FolderRow> = folders.iter().map(FolderRow::from).collect();
            output::print_list(&rows, format);
        }
        FolderCommand::Create {
            project,
            title,
            parent,
            description,
        } => {
            let ctx = args.actor.context()?;
            let folder = app
                .folders
                .create_folder(&ctx, *project, *parent, title, description.clone())
                .await?;
            output::print_success(&format!(
                "Folder '{}' created (id: {})",
                folder.title, folder.id
            ));
        }
        FolderCommand::Rename { id, title } => {
            let ctx = args.actor.context()?;
            let folder = app.folders.rename_folder(&ctx, *id, title).await?;
            output::print_success(&format!("Folder renamed to '{}'", folder.title));
        }
        FolderCommand::Describe { id, description } => {
            let ctx = args.actor.context()?;
            app.folders
                .update_description(&ctx, *id, description.clone())
                .await?;
            output::print_success("Description updated");
        }
        FolderCommand::Move { id, parent } => {
            let ctx = args.actor.context()?;
            let folder = app.folders.move_folder(&ctx, *id, *parent).await?;
            output::print_success(&format!(
                "Folder '{}' moved to {}",
                folder.title,
                app.tree.path_str(&folder).await?
            ));
        }
        FolderCommand::Delete { id, permanent, yes } => {
            let ctx = args.actor.context()?;
            if *permanent && !*yes {
                let folder = app.folders.get_folder(*id).await?;
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!(
                        "Permanently remove '{}' and everything beneath it?",
                        folder.title
                    ))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {}", e)))?;

                if !confirm {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            match app.lifecycle.delete(&ctx, *id, *permanent).await? {
                DeleteOutcome::SoftDeleted { folder } => {
                    output::print_success(&format!("Folder '{}' deleted", folder.title));
                }
                DeleteOutcome::Destroyed { summary } => {
                    output::print_success("Folder destroyed");
                    output::print_kv("Folders", &summary.folders.to_string());
                    output::print_kv("Files", &summary.files.to_string());
                    output::print_kv("Links", &summary.links.to_string());
                    output::print_kv("Locks", &summary.locks.to_string());
                    output::print_kv("Custom values", &summary.custom_values.to_string());
                }
            }
        }
        FolderCommand::Restore { id } => {
            let ctx = args.actor.context()?;
            let folder = app.lifecycle.restore(&ctx, *id).await?;
            output::print_success(&format!("Folder '{}' restored", folder.title));
        }
        FolderCommand::Copy {
            id,
            project,
            parent,
        } => {
            let ctx = args.actor.context()?;
            let report = app.copier.copy_to(&ctx, *id, *project, *parent).await?;
            if format == OutputFormat::Json {
                output::print_item(&report, format);
            } else {
                output::print_success(&format!(
                    "Copied to '{}' (id: {})",
                    report.folder.title, report.folder.id
                ));
                output::print_kv("Folders", &report.folders.to_string());
                output::print_kv("Files", &report.files.to_string());
                output::print_kv("Links", &report.links.to_string());
                output::print_kv("Custom values", &report.custom_values.to_string());
                for failure in &report.failures {
                    output::print_warning(&format!("{:?}: {}", failure.item, failure.message));
                }
            }
        }
        FolderCommand::Targets => {
            let ctx = args.actor.context()?;
            let projects = app.copier.allowed_target_projects(&ctx).await?;
            let rows: Vec<ProjectRow> = projects.iter().map(ProjectRow::from).collect();
            output::print_list(&rows, format);
        }
        FolderCommand::Tree {
            project,
            folder,
            exclude,
        } => {
            let entries = match folder {
                Some(folder_id) => {
                    let folder = app.folders.get_folder(*folder_id).await?;
                    if folder.project_id != *project {
                        return Err(AppError::validation(
                            "Folder belongs to another project",
                        ));
                    }
                    app.tree.folder_tree(&folder).await?
                }
                None => app.tree.directory_tree(*project, *exclude).await?,
            };
            match format {
                OutputFormat::Table => {
                    for entry in &entries {
                        println!("{}", entry.label);
                    }
                }
                OutputFormat::Json => {
                    let rows: Vec<EntryRow> = entries.iter().map(EntryRow::from).collect();
                    output::print_list(&rows, format);
                }
            }
        }
        FolderCommand::Stats { id } => {
            let folder = app.folders.get_folder(*id).await?;
            let stats = app.tree.deep_stats(&folder).await?;
            let items = app.tree.item_count(&folder).await?;
            let last_modified = app.tree.last_modified(&folder).await?;
            let notify = app.notifications.should_notify(&folder).await?;
            let locked = app.locks.is_locked(&folder).await?;

            match format {
                OutputFormat::Json => {
                    let value = serde_json::json!({
                        "folder_id": folder.id,
                        "files": stats.file_count,
                        "folders": stats.folder_count,
                        "size_bytes": stats.size_bytes,
                        "items": items,
                        "last_modified": last_modified,
                        "notify": notify,
                        "locked": locked,
                    });
                    output::print_item(&value, format);
                }
                OutputFormat::Table => {
                    println!("{}", folder.title);
                    output::print_kv("Files", &stats.file_count.to_string());
                    output::print_kv("Folders", &stats.folder_count.to_string());
                    output::print_kv("Size (bytes)", &stats.size_bytes.to_string());
                    output::print_kv("Direct items", &items.to_string());
                    output::print_kv(
                        "Last modified",
                        &last_modified.format("%Y-%m-%d %H:%M:%S").to_string(),
                    );
                    output::print_kv("Notifications", if notify { "on" } else { "off" });
                    output::print_kv("Locked", if locked { "yes" } else { "no" });
                }
            }
        }
        FolderCommand::Path { id } => {
            let folder = app.folders.get_folder(*id).await?;
            match format {
                OutputFormat::Table => println!("{}", app.tree.path_str(&folder).await?),
                OutputFormat::Json => {
                    let path = app.tree.path_of(&folder).await?;
                    let rows: Vec<FolderRow> = path.iter().map(FolderRow::from).collect();
                    output::print_list(&rows, format);
                }
            }
        }
        FolderCommand::Notify { id, setting } => {
            let ctx = args.actor.context()?;
            let folder = match setting {
                NotifyArg::On => app.notifications.activate_notifications(&ctx, *id).await?,
                NotifyArg::Inherit => {
                    app.notifications
                        .deactivate_notifications(&ctx, *id)
                        .await?
                }
                NotifyArg::Off => {
                    app.notifications
                        .set_notification(&ctx, *id, (*setting).into())
                        .await?
                }
            };
            let effective = app.notifications.should_notify(&folder).await?;
            output::print_success(&format!(
                "Notifications for '{}' are now {}",
                folder.title,
                if effective { "on" } else { "off" }
            ));
        }
        FolderCommand::Lock { id, file, minutes } => {
            let ctx = args.actor.context()?;
            let expires_at = minutes.map(|m| Utc::now() + Duration::minutes(m));
            let lock = match (id, file) {
                (_, Some(file_id)) => app.locks.lock_file(&ctx, *file_id, expires_at).await?,
                (Some(folder_id), None) => {
                    app.locks.lock_folder(&ctx, *folder_id, expires_at).await?
                }
                (None, None) => {
                    return Err(AppError::validation("A folder ID or --file is required"));
                }
            };
            output::print_success(&format!("Locked (lock id: {})", lock.id));
        }
        FolderCommand::Unlock { lock_id } => {
            let ctx = args.actor.context()?;
            app.locks.unlock(&ctx, *lock_id).await?;
            output::print_success("Lock released");
        }
    }

    Ok(())
}
