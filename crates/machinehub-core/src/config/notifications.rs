//! Notification pipeline configuration.

use serde::{Deserialize, Serialize};

/// Notification store and rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Page size for the notification feed.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// Deduplication window in milliseconds. Two records for the same
    /// machine and kind whose timestamps round into the same bucket are
    /// treated as one physical event.
    #[serde(default = "default_dedup_window")]
    pub dedup_window_ms: u64,
    /// Toast auto-dismiss duration in milliseconds.
    #[serde(default = "default_toast_duration")]
    pub toast_duration_ms: u64,
    /// Tag prefix for rendered system notifications.
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            dedup_window_ms: default_dedup_window(),
            toast_duration_ms: default_toast_duration(),
            tag_prefix: default_tag_prefix(),
        }
    }
}

fn default_page_size() -> u64 {
    20
}

fn default_dedup_window() -> u64 {
    2_000
}

fn default_toast_duration() -> u64 {
    3_000
}

fn default_tag_prefix() -> String {
    "machinehub".to_string()
}
