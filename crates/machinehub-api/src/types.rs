//! Request and response types for the backend REST API.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use machinehub_core::events::NormalizedEvent;
use machinehub_core::types::PageRequest;

/// Query parameters for `GET /api/iot/events`.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    /// Named range shortcut understood by the backend (e.g. `today`).
    pub range: Option<String>,
    /// Inclusive lower bound.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub end_date: Option<DateTime<Utc>>,
    /// Page request.
    pub page: PageRequest,
}

impl EventQuery {
    /// Query for a page of events within explicit bounds.
    pub fn bounded(
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
        page: PageRequest,
    ) -> Self {
        Self {
            range: None,
            start_date,
            end_date,
            page,
        }
    }

    /// Serialize into query-string pairs using the backend's parameter
    /// names.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.page.to_string()),
            ("pageSize".to_string(), self.page.page_size.to_string()),
        ];
        if let Some(range) = &self.range {
            params.push(("range".to_string(), range.clone()));
        }
        if let Some(start) = &self.start_date {
            params.push(("startDate".to_string(), start.to_rfc3339()));
        }
        if let Some(end) = &self.end_date {
            params.push(("endDate".to_string(), end.to_rfc3339()));
        }
        params
    }
}

/// One page of normalized event history.
#[derive(Debug, Clone)]
pub struct EventPage {
    /// Normalized events in server order. Events the normalizer rejected
    /// (no machine id) are already dropped.
    pub events: Vec<NormalizedEvent>,
    /// Total number of events across all pages.
    pub total: u64,
    /// Page number reported by the server (1-based).
    pub page: u64,
    /// Page size reported by the server.
    pub page_size: u64,
    /// Total number of pages reported by the server.
    pub total_pages: u64,
}

/// Raw paginated envelope of the events endpoint. Event bodies stay as
/// JSON values until the normalizer has seen them.
#[derive(Debug, Deserialize)]
pub(crate) struct EventPageWire {
    #[serde(default)]
    pub events: Vec<serde_json::Value>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u64,
    #[serde(default, rename = "pageSize")]
    pub page_size: u64,
    #[serde(default, rename = "totalPages")]
    pub total_pages: u64,
}

/// Envelope of the latest-event fallback endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct LatestEventWire {
    #[serde(default)]
    pub events: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub event: Option<serde_json::Value>,
}

/// One row of `GET /api/machines/coins/by-machine`.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineCoins {
    /// Machine id.
    pub machine_id: String,
    /// Lifetime coin count.
    pub total_coins: u64,
}

/// Envelope of `GET /api/machines/coins/total`.
#[derive(Debug, Deserialize)]
pub(crate) struct TotalCoinsWire {
    #[serde(rename = "totalCoins")]
    pub total_coins: u64,
}

/// One row of `GET /api/machines/:id/power-logs`.
#[derive(Debug, Clone, Deserialize)]
pub struct PowerLogEntry {
    /// Power transition, as labeled by the backend.
    pub event: PowerLogKind,
    /// Instant of the transition.
    pub ts: DateTime<Utc>,
    /// Minutes powered, present on `Apagado` rows.
    #[serde(default)]
    pub dur: Option<u64>,
}

/// Power transition labels used by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PowerLogKind {
    /// Powered on.
    Encendido,
    /// Powered off.
    Apagado,
}

/// Web-push subscription registered with the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscription {
    /// Delivery endpoint.
    pub endpoint: String,
    /// Client keys.
    pub keys: PushSubscriptionKeys,
}

/// Key material of a push subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscriptionKeys {
    /// Client public key.
    pub p256dh: String,
    /// Shared auth secret.
    pub auth: String,
}

/// Envelope of `GET /api/push/vapid-public`.
#[derive(Debug, Deserialize)]
pub(crate) struct VapidKeyWire {
    #[serde(default, alias = "publicKey", alias = "key")]
    pub public_key: Option<String>,
}

/// Coin value map keyed by machine type.
pub type CoinValues = HashMap<String, f64>;
