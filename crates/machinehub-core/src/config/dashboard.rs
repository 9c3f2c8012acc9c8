//! Dashboard orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Dashboard refresh settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Interval in seconds of the full-refresh backstop that runs
    /// independently of event-driven updates.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: default_refresh_interval(),
        }
    }
}

fn default_refresh_interval() -> u64 {
    15
}
