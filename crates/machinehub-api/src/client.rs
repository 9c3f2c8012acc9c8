//! Typed client for the MachineHub backend.

use std::sync::RwLock;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing;

use machinehub_core::config::api::ApiConfig;
use machinehub_core::error::AppError;
use machinehub_core::events::{self, NormalizedEvent};
use machinehub_core::result::AppResult;
use machinehub_core::types::{Machine, MachineId};

use crate::types::{
    CoinValues, EventPage, EventPageWire, EventQuery, LatestEventWire, MachineCoins,
    PowerLogEntry, PushSubscription, TotalCoinsWire, VapidKeyWire,
};

/// REST client with bearer-token authentication.
///
/// Cheap to share behind an `Arc`; the token can be swapped at runtime
/// after a login or logout without rebuilding the client.
#[derive(Debug)]
pub struct ApiClient {
    /// Backend base URL without a trailing slash.
    base_url: String,
    /// Underlying HTTP client.
    http: reqwest::Client,
    /// Current bearer token, if signed in.
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Build a client from configuration.
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            token: RwLock::new(None),
        })
    }

    /// Backend base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Install or clear the bearer token.
    pub fn set_token(&self, token: Option<String>) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = token;
    }

    fn current_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{path}", self.base_url));
        if let Some(token) = self.current_token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        what: &str,
    ) -> AppResult<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| AppError::with_source(
                machinehub_core::error::ErrorKind::Network,
                format!("Request for {what} failed: {e}"),
                e,
            ))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status, what));
        }

        response.json::<T>().await.map_err(|e| {
            AppError::with_source(
                machinehub_core::error::ErrorKind::Serialization,
                format!("Invalid {what} response body: {e}"),
                e,
            )
        })
    }

    fn status_error(status: StatusCode, what: &str) -> AppError {
        match status {
            StatusCode::UNAUTHORIZED => {
                AppError::authentication(format!("Unauthorized while fetching {what}"))
            }
            StatusCode::FORBIDDEN => {
                AppError::authorization(format!("Forbidden while fetching {what}"))
            }
            StatusCode::NOT_FOUND => AppError::not_found(format!("{what} not found")),
            s if s.is_server_error() => {
                AppError::service_unavailable(format!("Backend error {s} while fetching {what}"))
            }
            s => AppError::network(format!("Unexpected status {s} while fetching {what}")),
        }
    }

    // ── Event history ───────────────────────────────────────────

    /// Fetch a page of event history, normalized.
    pub async fn get_events(&self, query: &EventQuery) -> AppResult<EventPage> {
        let builder = self
            .request(reqwest::Method::GET, "/api/iot/events")
            .query(&query.to_params());
        let wire: EventPageWire = self.send_json(builder, "event history").await?;

        let received = wire.events.len();
        let events: Vec<NormalizedEvent> =
            wire.events.iter().filter_map(events::normalize).collect();
        if events.len() < received {
            tracing::debug!(
                dropped = received - events.len(),
                "Dropped history events without a machine id"
            );
        }

        Ok(EventPage {
            events,
            total: wire.total,
            page: wire.page.max(1),
            page_size: wire.page_size,
            total_pages: wire.total_pages.max(1),
        })
    }

    /// Fetch the single most recent event. Used only as the push
    /// fallback.
    pub async fn latest_event(&self) -> AppResult<Option<NormalizedEvent>> {
        let builder = self.request(reqwest::Method::GET, "/api/iot/events/latest");
        let wire: LatestEventWire = self.send_json(builder, "latest event").await?;

        let value = wire
            .event
            .or_else(|| wire.events.and_then(|evs| evs.into_iter().next()));
        Ok(value.as_ref().and_then(events::normalize))
    }

    // ── Machine directory ───────────────────────────────────────

    /// Fetch the machine directory.
    pub async fn get_machines(&self) -> AppResult<Vec<Machine>> {
        let builder = self.request(reqwest::Method::GET, "/api/machines");
        self.send_json(builder, "machine directory").await
    }

    /// Fetch on/off history of one machine within optional bounds.
    pub async fn get_power_logs(
        &self,
        machine_id: &MachineId,
        start_date: Option<chrono::DateTime<chrono::Utc>>,
        end_date: Option<chrono::DateTime<chrono::Utc>>,
    ) -> AppResult<Vec<PowerLogEntry>> {
        let mut params: Vec<(String, String)> = Vec::new();
        if let Some(start) = start_date {
            params.push(("startDate".to_string(), start.to_rfc3339()));
        }
        if let Some(end) = end_date {
            params.push(("endDate".to_string(), end.to_rfc3339()));
        }
        let builder = self
            .request(
                reqwest::Method::GET,
                &format!("/api/machines/{machine_id}/power-logs"),
            )
            .query(&params);
        self.send_json(builder, "power logs").await
    }

    // ── Coin tallies and pricing ────────────────────────────────

    /// Fetch lifetime coin counts per machine.
    pub async fn get_coins_by_machine(&self) -> AppResult<Vec<MachineCoins>> {
        let builder = self.request(reqwest::Method::GET, "/api/machines/coins/by-machine");
        self.send_json(builder, "coin counts").await
    }

    /// Fetch the fleet-wide coin total.
    pub async fn get_total_coins(&self) -> AppResult<u64> {
        let builder = self.request(reqwest::Method::GET, "/api/machines/coins/total");
        let wire: TotalCoinsWire = self.send_json(builder, "coin total").await?;
        Ok(wire.total_coins)
    }

    /// Fetch the coin value map.
    pub async fn get_coin_values(&self) -> AppResult<CoinValues> {
        let builder = self.request(reqwest::Method::GET, "/api/coin-values");
        self.send_json(builder, "coin values").await
    }

    /// Update one coin value.
    pub async fn set_coin_value(&self, machine_type: &str, value: f64) -> AppResult<()> {
        let builder = self
            .request(
                reqwest::Method::PUT,
                &format!("/api/coin-values/{machine_type}"),
            )
            .json(&serde_json::json!({ "value": value }));
        let _: serde_json::Value = self.send_json(builder, "coin value update").await?;
        Ok(())
    }

    // ── Push subscription lifecycle ─────────────────────────────

    /// Fetch the VAPID public key, if the backend has push configured.
    pub async fn get_vapid_public_key(&self) -> AppResult<Option<String>> {
        let builder = self.request(reqwest::Method::GET, "/api/push/vapid-public");
        let wire: VapidKeyWire = self.send_json(builder, "VAPID key").await?;
        Ok(wire.public_key.filter(|k| !k.is_empty()))
    }

    /// Register a push subscription with the backend.
    pub async fn subscribe_push(&self, subscription: &PushSubscription) -> AppResult<()> {
        let builder = self
            .request(reqwest::Method::POST, "/api/push/subscribe")
            .json(subscription);
        let _: serde_json::Value = self.send_json(builder, "push subscribe").await?;
        Ok(())
    }

    /// Remove a push subscription from the backend.
    pub async fn unsubscribe_push(&self, endpoint: &str) -> AppResult<()> {
        let builder = self
            .request(reqwest::Method::POST, "/api/push/unsubscribe")
            .json(&serde_json::json!({ "endpoint": endpoint }));
        let _: serde_json::Value = self.send_json(builder, "push unsubscribe").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use machinehub_core::types::PageRequest;

    #[test]
    fn test_query_params_use_backend_names() {
        let query = EventQuery {
            range: Some("today".to_string()),
            start_date: None,
            end_date: None,
            page: PageRequest::new(2, 20),
        };
        let params = query.to_params();
        assert!(params.contains(&("page".to_string(), "2".to_string())));
        assert!(params.contains(&("pageSize".to_string(), "20".to_string())));
        assert!(params.contains(&("range".to_string(), "today".to_string())));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = ApiConfig {
            base_url: "http://localhost:3000/".to_string(),
            ..ApiConfig::default()
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(ApiClient::status_error(StatusCode::UNAUTHORIZED, "x").is_auth_failure());
        assert!(ApiClient::status_error(StatusCode::FORBIDDEN, "x").is_auth_failure());
        assert!(!ApiClient::status_error(StatusCode::BAD_GATEWAY, "x").is_auth_failure());
    }
}
