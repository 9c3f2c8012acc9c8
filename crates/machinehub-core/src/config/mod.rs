//! Agent configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod api;
pub mod dashboard;
pub mod logging;
pub mod notifications;
pub mod push;
pub mod realtime;
pub mod storage;

use serde::{Deserialize, Serialize};

use self::api::ApiConfig;
use self::dashboard::DashboardConfig;
use self::logging::LoggingConfig;
use self::notifications::NotificationsConfig;
use self::push::PushConfig;
use self::realtime::RealtimeConfig;
use self::storage::DeviceStorageConfig;

use crate::error::AppError;

/// Root agent configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Backend REST API settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Live WebSocket channel settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Push channel settings.
    #[serde(default)]
    pub push: PushConfig,
    /// Notification pipeline settings.
    #[serde(default)]
    pub notifications: NotificationsConfig,
    /// Dashboard refresh settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Local device storage settings.
    #[serde(default)]
    pub storage: DeviceStorageConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AgentConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `MACHINEHUB__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("MACHINEHUB")
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
