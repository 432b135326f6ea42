//! Cache key builders.
//!
//! WebDAV listings are cached per parent collection, so a change to a
//! folder makes the listing of the collection holding it stale.

use dms_core::types::{FolderId, ProjectId};

/// Prefix of every directory listing entry.
const PROPFIND: &str = "PROPFIND";

/// Key of the cached listing of `parent_id` in `project_id`; the project
/// root when `parent_id` is `None`.
pub fn propfind(project_id: ProjectId, parent_id: Option<FolderId>) -> String {
    match parent_id {
        Some(parent) => format!("{PROPFIND}/{project_id}/{parent}"),
        None => format!("{PROPFIND}/{project_id}"),
    }
}
