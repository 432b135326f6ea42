//! Folder domain entities.

pub mod model;
pub mod notification;
pub mod tree;

pub use model::{CreateFolder, Folder, INVALID_TITLE_CHARACTERS, title_has_invalid_character};
pub use notification::NotificationSetting;
pub use tree::{DirectoryEntry, FolderStats};
