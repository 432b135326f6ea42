//! PostgreSQL repositories backing [`PgEntityStore`](crate::postgres::PgEntityStore).

pub mod custom_value;
pub mod file;
pub mod folder;
pub mod link;
pub mod lock;
pub mod project;

pub use custom_value::CustomValueRepository;
pub use file::FileRepository;
pub use folder::FolderRepository;
pub use link::LinkRepository;
pub use lock::LockRepository;
pub use project::ProjectRepository;

use dms_entity::{DeletedState, Visibility};

/// The `deleted` column value a scope selects, or `None` for every state.
pub(crate) fn deleted_filter(scope: Visibility) -> Option<i16> {
    match scope {
        Visibility::Active => Some(DeletedState::Active.as_i16()),
        Visibility::Deleted => Some(DeletedState::Deleted.as_i16()),
        Visibility::All => None,
    }
}
