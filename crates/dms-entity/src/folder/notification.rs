//! Tri-state notification override.

use serde::{Deserialize, Serialize};

/// Per-folder notification override.
///
/// Persisted as a nullable boolean: `true` for [`On`](Self::On), `false`
/// for [`Off`](Self::Off), and `NULL` for [`Inherit`](Self::Inherit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationSetting {
    /// Notifications explicitly enabled.
    On,
    /// Notifications explicitly disabled.
    Off,
    /// Defer to the parent folder, then the project.
    #[default]
    Inherit,
}

impl NotificationSetting {
    /// The persisted column value.
    pub fn as_option(self) -> Option<bool> {
        match self {
            Self::On => Some(true),
            Self::Off => Some(false),
            Self::Inherit => None,
        }
    }
}

impl From<Option<bool>> for NotificationSetting {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::On,
            Some(false) => Self::Off,
            None => Self::Inherit,
        }
    }
}

impl std::str::FromStr for NotificationSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "inherit" => Ok(Self::Inherit),
            other => Err(format!("Unknown notification setting: {other}")),
        }
    }
}
