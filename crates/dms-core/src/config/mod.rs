//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! an optional TOML file overlaid with `DMS__*` environment variables.
//! Every field carries a serde default, so an empty source is valid.

pub mod cache;
pub mod database;
pub mod dms;
pub mod logging;

use serde::{Deserialize, Serialize};

pub use self::cache::{CacheConfig, MemoryCacheConfig};
pub use self::database::DatabaseConfig;
pub use self::dms::DmsConfig;
pub use self::logging::LoggingConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Entity store settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Response cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Folder behaviour settings.
    #[serde(default)]
    pub dms: DmsConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file and the environment.
    ///
    /// The file is optional; environment variables use the `DMS` prefix
    /// and `__` as the section separator (e.g. `DMS__DATABASE__URL`).
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("DMS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
