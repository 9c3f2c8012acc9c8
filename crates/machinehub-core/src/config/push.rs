//! Push channel configuration.

use serde::{Deserialize, Serialize};

/// Push channel settings for the background worker context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Whether the push subscription should be initialized at startup.
    /// Failure to subscribe is never fatal either way.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// WebSocket URL of the push gateway. When empty, it is derived from
    /// the API base URL by swapping the scheme and appending `/push`.
    #[serde(default)]
    pub gateway_url: String,
    /// Timeout in seconds for the single bounded fallback fetch issued
    /// when a push body cannot be parsed.
    #[serde(default = "default_fallback_timeout")]
    pub fallback_timeout_seconds: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            gateway_url: String::new(),
            fallback_timeout_seconds: default_fallback_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_fallback_timeout() -> u64 {
    10
}
