//! Live WebSocket channel configuration.

use serde::{Deserialize, Serialize};

/// Live channel (WebSocket) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// WebSocket URL of the live event channel. When empty, it is derived
    /// from the API base URL by swapping the scheme and appending `/ws`.
    #[serde(default)]
    pub url: String,
    /// Initial reconnect delay in milliseconds.
    #[serde(default = "default_reconnect_initial")]
    pub reconnect_initial_ms: u64,
    /// Maximum reconnect delay in milliseconds.
    #[serde(default = "default_reconnect_max")]
    pub reconnect_max_ms: u64,
    /// Buffer size of the channel carrying normalized events.
    #[serde(default = "default_event_buffer")]
    pub event_buffer_size: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            reconnect_initial_ms: default_reconnect_initial(),
            reconnect_max_ms: default_reconnect_max(),
            event_buffer_size: default_event_buffer(),
        }
    }
}

fn default_reconnect_initial() -> u64 {
    500
}

fn default_reconnect_max() -> u64 {
    30_000
}

fn default_event_buffer() -> usize {
    256
}
