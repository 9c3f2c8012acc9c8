//! Coin value store.
//!
//! Pricing per machine type, with an explicit load/refresh lifecycle:
//! stored values are applied first so the dashboard has prices
//! immediately, then the API result replaces and re-persists them. An
//! API failure keeps whatever was stored.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing;

use machinehub_api::ApiClient;
use machinehub_core::error::AppError;
use machinehub_core::result::AppResult;

use crate::device::DeviceStorage;
use crate::keys;

/// Pricing map keyed by normalized machine type.
pub struct CoinValueStore {
    api: Arc<ApiClient>,
    storage: Arc<DeviceStorage>,
    values: RwLock<HashMap<String, f64>>,
    loaded: RwLock<bool>,
}

impl CoinValueStore {
    /// Create an unloaded store.
    pub fn new(api: Arc<ApiClient>, storage: Arc<DeviceStorage>) -> Self {
        Self {
            api,
            storage,
            values: RwLock::new(HashMap::new()),
            loaded: RwLock::new(false),
        }
    }

    /// Load once: storage first, then the API. Later calls are no-ops.
    pub async fn ensure_loaded(&self) {
        {
            let loaded = self.loaded.read().await;
            if *loaded {
                return;
            }
        }

        if let Some(stored) = self
            .storage
            .get_json::<HashMap<String, serde_json::Value>>(keys::COIN_VALUES_BY_TYPE)
        {
            let normalized = normalize_map(stored);
            *self.values.write().await = normalized;
        }

        if let Err(e) = self.refresh().await {
            // Keep whatever storage provided.
            tracing::warn!("Coin value refresh failed, using stored values: {e}");
        }

        *self.loaded.write().await = true;
    }

    /// Replace values from the API and re-persist.
    pub async fn refresh(&self) -> AppResult<()> {
        let fetched = self.api.get_coin_values().await?;
        let normalized = normalize_map(
            fetched
                .into_iter()
                .map(|(k, v)| (k, serde_json::json!(v)))
                .collect(),
        );
        self.storage.set_json(keys::COIN_VALUES_BY_TYPE, &normalized);
        *self.values.write().await = normalized;
        Ok(())
    }

    /// Update one value on the backend, then refresh.
    pub async fn set_value(&self, machine_type: &str, value: f64) -> AppResult<()> {
        let key = machine_type.trim().to_lowercase();
        if key.is_empty() {
            return Err(AppError::validation("Machine type must not be empty"));
        }
        self.api.set_coin_value(&key, value).await?;
        self.refresh().await
    }

    /// Value for a machine type, if priced.
    pub async fn value_for(&self, machine_type: &str) -> Option<f64> {
        self.values
            .read()
            .await
            .get(&machine_type.trim().to_lowercase())
            .copied()
    }

    /// Snapshot of the full map.
    pub async fn snapshot(&self) -> HashMap<String, f64> {
        self.values.read().await.clone()
    }
}

/// Normalize a raw map: keys trimmed and lowercased, non-numeric values
/// dropped.
fn normalize_map(input: HashMap<String, serde_json::Value>) -> HashMap<String, f64> {
    let mut out = HashMap::new();
    for (key, value) in input {
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        let number = match &value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        if let Some(number) = number.filter(|n| n.is_finite()) {
            out.insert(key, number);
        }
    }
    out
}
