//! Folder behaviour settings.

use serde::{Deserialize, Serialize};

/// Settings that shape folder defaults and tree walks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DmsConfig {
    /// Whether new folders start with notifications explicitly enabled.
    /// When `false` they inherit from their parent or project.
    #[serde(default)]
    pub default_notifications: bool,
    /// Maximum folder depth any tree walk will descend before failing.
    #[serde(default = "default_max_tree_depth")]
    pub max_tree_depth: usize,
    /// Label of the project root entry in directory select trees.
    #[serde(default = "default_root_label")]
    pub root_label: String,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            default_notifications: false,
            max_tree_depth: default_max_tree_depth(),
            root_label: default_root_label(),
        }
    }
}

fn default_max_tree_depth() -> usize {
    256
}

fn default_root_label() -> String {
    "Documents".to_string()
}
