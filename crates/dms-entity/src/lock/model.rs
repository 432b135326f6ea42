//! Lock entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dms_core::types::{FileId, FolderId, LockId, UserId};

/// The record a lock applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum LockEntity {
    /// A folder (and, by inheritance, its subtree).
    Folder(FolderId),
    /// A single file.
    File(FileId),
}

impl LockEntity {
    /// The persisted entity-type discriminator.
    pub fn type_code(&self) -> i16 {
        match self {
            Self::File(_) => 0,
            Self::Folder(_) => 1,
        }
    }

    /// The raw id of the locked record.
    pub fn uuid(&self) -> uuid::Uuid {
        match self {
            Self::Folder(id) => id.into_uuid(),
            Self::File(id) => id.into_uuid(),
        }
    }
}

/// An advisory lock on a folder or file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lock {
    /// Unique lock identifier.
    pub id: LockId,
    /// The locked record.
    pub entity: LockEntity,
    /// The user holding the lock.
    pub user_id: UserId,
    /// When the lock lapses (None = until unlocked).
    pub expires_at: Option<DateTime<Utc>>,
    /// When the lock was taken.
    pub created_at: DateTime<Utc>,
    /// When the lock was last refreshed.
    pub updated_at: DateTime<Utc>,
}

impl Lock {
    /// Whether the lock is in force at `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|exp| exp > now)
    }
}

/// Data required to take a lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLock {
    /// The record to lock.
    pub entity: LockEntity,
    /// The user taking the lock.
    pub user_id: UserId,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
}
