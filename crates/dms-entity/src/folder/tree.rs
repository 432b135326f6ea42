//! Derived tree values used for display and reporting.

use serde::{Deserialize, Serialize};

use dms_core::types::FolderId;

/// An entry of a directory select tree.
///
/// The label is the folder title prefixed with `"..."` once per level;
/// the project root entry carries no folder id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Indented display label.
    pub label: String,
    /// The folder, or `None` for the project root.
    pub folder_id: Option<FolderId>,
}

impl DirectoryEntry {
    /// Create an entry.
    pub fn new(label: impl Into<String>, folder_id: Option<FolderId>) -> Self {
        Self {
            label: label.into(),
            folder_id,
        }
    }
}

/// Deep aggregates of a folder's visible subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderStats {
    /// Active files plus active file and URL links.
    pub file_count: u64,
    /// Active subfolders plus active folder links.
    pub folder_count: u64,
    /// Total size of active files in bytes.
    pub size_bytes: u64,
}
