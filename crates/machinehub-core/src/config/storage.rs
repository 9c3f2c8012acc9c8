//! Local device storage configuration.

use serde::{Deserialize, Serialize};

/// Local device storage settings.
///
/// The agent persists a small set of keys (auth token, unread cursor,
/// date-range preferences, cached coin values) in a single JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceStorageConfig {
    /// Path of the key-value JSON file.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for DeviceStorageConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

fn default_path() -> String {
    "data/device_storage.json".to_string()
}
