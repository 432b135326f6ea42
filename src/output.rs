//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};

use dms_entity::folder::Folder;
use dms_entity::folder::tree::DirectoryEntry;
use dms_entity::project::Project;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Folder display row
#[derive(Debug, Serialize, Tabled)]
pub struct FolderRow {
    /// Folder ID
    pub id: String,
    /// Title
    pub title: String,
    /// Parent folder, blank at the project root
    pub parent: String,
    /// Active or deleted
    pub state: String,
    /// Notification override
    pub notification: String,
    /// Last update
    pub updated_at: String,
}

impl From<&Folder> for FolderRow {
    fn from(folder: &Folder) -> Self {
        Self {
            id: folder.id.to_string(),
            title: folder.title.clone(),
            parent: folder
                .parent_id
                .map(|p| p.to_string())
                .unwrap_or_default(),
            state: if folder.is_active() { "active" } else { "deleted" }.to_string(),
            notification: format!("{:?}", folder.notification).to_lowercase(),
            updated_at: folder.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Directory tree display row
#[derive(Debug, Serialize, Tabled)]
pub struct EntryRow {
    /// Indented label
    pub label: String,
    /// Folder ID, blank for the project root
    pub folder_id: String,
}

impl From<&DirectoryEntry> for EntryRow {
    fn from(entry: &DirectoryEntry) -> Self {
        Self {
            label: entry.label.clone(),
            folder_id: entry
                .folder_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        }
    }
}

/// Project display row
#[derive(Debug, Serialize, Tabled)]
pub struct ProjectRow {
    /// Project ID
    pub id: String,
    /// Name
    pub name: String,
}

impl From<&Project> for ProjectRow {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.to_string(),
            name: project.name.clone(),
        }
    }
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                let table = Table::new(items).to_string();
                println!("{}", table);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{}", json);
        }
    }
}

/// Print a single item in the selected format
pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!("{:#?}", item);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
            println!("{}", json);
        }
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {}", msg);
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{}:", key), value);
}
