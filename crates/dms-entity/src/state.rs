//! Soft-delete state shared by folders, files, and links.

use serde::{Deserialize, Serialize};

use dms_core::error::AppError;

/// Soft-delete flag of a stored record.
///
/// Persisted as a `SMALLINT` (`0` active, `1` deleted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletedState {
    /// Visible in listings and aggregates.
    #[default]
    Active,
    /// Soft-deleted; kept for a later restore.
    Deleted,
}

impl DeletedState {
    /// The persisted column value.
    pub fn as_i16(self) -> i16 {
        match self {
            Self::Active => 0,
            Self::Deleted => 1,
        }
    }

    /// Whether the record is visible.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl TryFrom<i16> for DeletedState {
    type Error = AppError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Active),
            1 => Ok(Self::Deleted),
            other => Err(AppError::database(format!("Invalid deleted state: {other}"))),
        }
    }
}

/// Which records a store listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Only active records.
    Active,
    /// Only soft-deleted records.
    Deleted,
    /// Every record.
    All,
}

impl Visibility {
    /// Whether a record in `state` belongs to this scope.
    pub fn includes(self, state: DeletedState) -> bool {
        match self {
            Self::Active => state == DeletedState::Active,
            Self::Deleted => state == DeletedState::Deleted,
            Self::All => true,
        }
    }
}
