//! Dashboard orchestrator.
//!
//! Wires the notification store, the access scope filter, and both
//! transport adapters into the live dashboard. On start it connects the
//! live channel, subscribes the relay bus, initializes the push
//! subscription best-effort, loads the initial notification page, and
//! starts the periodic full refresh that backstops missed or duplicate
//! events. On shutdown every task is cancelled and joined; no timers or
//! sockets survive.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing;
use uuid::Uuid;

use machinehub_api::ApiClient;
use machinehub_api::types::{PushSubscription, PushSubscriptionKeys};
use machinehub_core::access::{AccessScope, filter_machines_for_role};
use machinehub_core::config::AgentConfig;
use machinehub_core::events::NormalizedEvent;
use machinehub_core::time;
use machinehub_core::types::{EventKind, UserRole};
use machinehub_realtime::{LiveClient, RelayBus, RelayEnvelope, RelayMessage};
use machinehub_store::{AddOutcome, DeviceStorage, NotificationStore};

use crate::state::DashboardState;
use crate::ui::{SoundCue, UiSink};
use crate::usage::{MachineUsage, derive_usage};

/// Handles of the running foreground tasks.
pub struct DashboardHandles {
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl DashboardHandles {
    /// Stop all foreground tasks and wait for them to finish.
    pub async fn stop(self) {
        self.shutdown.cancel();
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

/// The foreground dashboard.
pub struct Dashboard {
    config: AgentConfig,
    api: Arc<ApiClient>,
    scope: AccessScope,
    store: Mutex<NotificationStore>,
    state: Mutex<DashboardState>,
    ui: Arc<dyn UiSink>,
    /// Whether the dashboard is in the foreground. Relay events are only
    /// applied while hidden; the live channel covers the visible case.
    visible: AtomicBool,
    /// Flips to `true` on an authorization failure; observers route the
    /// user back to login and the refresh loop stops retrying.
    logged_out: watch::Sender<bool>,
}

impl Dashboard {
    /// Compose a dashboard. The scope comes from device storage (role
    /// and assignment list of the signed-in user).
    pub fn new(
        config: AgentConfig,
        api: Arc<ApiClient>,
        storage: Arc<DeviceStorage>,
        ui: Arc<dyn UiSink>,
    ) -> Self {
        let scope = storage.access_scope();
        let store = NotificationStore::new(
            config.notifications.clone(),
            scope.clone(),
            storage,
        );
        Self {
            config,
            api,
            scope,
            store: Mutex::new(store),
            state: Mutex::new(DashboardState::default()),
            ui,
            visible: AtomicBool::new(true),
            logged_out: watch::channel(false).0,
        }
    }

    /// Observe forced-logout state.
    pub fn logged_out(&self) -> watch::Receiver<bool> {
        self.logged_out.subscribe()
    }

    /// Mark the dashboard visible or hidden (backgrounded).
    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Relaxed);
    }

    /// Open the notifications panel: pending records become seen and new
    /// ones no longer count as unread.
    pub async fn open_notifications_panel(&self) {
        let mut store = self.store.lock().await;
        store.set_viewing_panel(true);
        store.mark_seen();
    }

    /// Close the notifications panel.
    pub async fn close_notifications_panel(&self) {
        self.store.lock().await.set_viewing_panel(false);
    }

    /// Current unread count.
    pub async fn unread_count(&self) -> u64 {
        self.store.lock().await.unread_count()
    }

    /// Run a closure against the notification store.
    pub async fn with_store<R>(&self, f: impl FnOnce(&mut NotificationStore) -> R) -> R {
        let mut store = self.store.lock().await;
        f(&mut store)
    }

    /// Run a closure against the dashboard state.
    pub async fn with_state<R>(&self, f: impl FnOnce(&mut DashboardState) -> R) -> R {
        let mut state = self.state.lock().await;
        f(&mut state)
    }

    // ── Startup ─────────────────────────────────────────────────

    /// Start all foreground tasks.
    pub async fn start(self: &Arc<Self>, relay: RelayBus) -> DashboardHandles {
        let shutdown = CancellationToken::new();
        let mut tasks = Vec::new();

        // Initial data: preferences, first notification page, directory.
        {
            let mut store = self.store.lock().await;
            store.restore_preferences();
            if let Err(e) = store.load_from_server(&self.api, 1).await {
                tracing::warn!("Initial notification load failed: {e}");
            }
        }
        self.refresh_dashboard_data().await;

        // Push subscription is best-effort; a denied or failed
        // subscription leaves the live channel as the only source.
        if self.config.push.enabled {
            if let Err(e) = self.init_push_subscription().await {
                tracing::warn!("Push subscription init failed: {e}");
            }
        }

        // Live channel.
        let (events_tx, mut events_rx) = mpsc::channel::<NormalizedEvent>(
            self.config.realtime.event_buffer_size.max(1),
        );
        let live = LiveClient::new(&self.config.realtime, self.api.base_url());
        tasks.push(tokio::spawn({
            let shutdown = shutdown.clone();
            async move { live.run(events_tx, shutdown).await }
        }));

        // Live event consumer: appends in arrival order.
        tasks.push(tokio::spawn({
            let dashboard = Arc::clone(self);
            let shutdown = shutdown.clone();
            async move {
                loop {
                    let event = tokio::select! {
                        _ = shutdown.cancelled() => break,
                        ev = events_rx.recv() => ev,
                    };
                    let Some(event) = event else { break };
                    dashboard.handle_live_event(event).await;
                }
            }
        }));

        // Relay consumer: push events reaching the open foreground.
        let mut relay_rx = relay.subscribe();
        tasks.push(tokio::spawn({
            let dashboard = Arc::clone(self);
            let shutdown = shutdown.clone();
            async move {
                loop {
                    let envelope = tokio::select! {
                        _ = shutdown.cancelled() => break,
                        env = relay_rx.recv() => env,
                    };
                    match envelope {
                        Ok(envelope) => dashboard.handle_relay(envelope).await,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                            tracing::warn!(missed, "Relay consumer lagged");
                        }
                        Err(_) => break,
                    }
                }
            }
        }));

        // Periodic full refresh, independent of event-driven updates.
        tasks.push(tokio::spawn({
            let dashboard = Arc::clone(self);
            let shutdown = shutdown.clone();
            let period = Duration::from_secs(
                self.config.dashboard.refresh_interval_seconds.max(1),
            );
            async move {
                let mut interval = tokio::time::interval(period);
                interval.tick().await; // immediate first tick already covered above
                loop {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = interval.tick() => {}
                    }
                    if *dashboard.logged_out.borrow() {
                        break;
                    }
                    dashboard.refresh_dashboard_data().await;
                }
            }
        }));

        DashboardHandles { shutdown, tasks }
    }

    // ── Live channel handling ───────────────────────────────────

    /// Process one live-channel event: scope check, directory update,
    /// coin tallies, feed append, toast and sound.
    pub async fn handle_live_event(&self, event: NormalizedEvent) {
        if !self.scope.can_access(&event.machine_id) {
            return;
        }

        let kind = event.kind;
        let machine_id = event.machine_id.clone();
        let timestamp = event.timestamp;
        let amount = event.amount;

        // Directory updates first so the record picks up display labels.
        match kind {
            EventKind::MachineOn | EventKind::MachineOff => {
                let known = self
                    .with_state(|state| {
                        state.apply_power_event(
                            &machine_id,
                            kind == EventKind::MachineOn,
                            timestamp,
                        )
                    })
                    .await;
                if !known {
                    self.refresh_dashboard_data().await;
                }
            }
            EventKind::CoinInserted => {
                let event_is_today =
                    time::local_date(&timestamp) == time::today_local();
                self.with_state(|state| {
                    state.add_coins(&machine_id, amount.unwrap_or(1), event_is_today)
                })
                .await;
            }
            EventKind::Other => {}
        }

        self.append_event(event).await;
    }

    // ── Relay handling ──────────────────────────────────────────

    /// Process one worker relay message.
    pub async fn handle_relay(&self, envelope: RelayEnvelope) {
        match envelope.message {
            RelayMessage::CoinNotification(_) => {
                // Matches the dashboard's admin-only audible cue for
                // relayed coin events.
                if self.scope.role == UserRole::Admin {
                    self.ui.play(SoundCue::Coin).await;
                }
            }
            RelayMessage::EventNotification(event) => {
                // The live channel already covers the visible case;
                // applying relays too would double-handle.
                if self.visible.load(Ordering::Relaxed) {
                    return;
                }
                if !self.scope.can_access(&event.machine_id) {
                    return;
                }
                self.append_event(event).await;
            }
        }
    }

    // ── Shared append path ──────────────────────────────────────

    /// Append one event to the feed, enrich labels from the directory,
    /// and present toast and sound. The store's own scope check and
    /// dedup make this path safe for both delivery channels.
    async fn append_event(&self, event: NormalizedEvent) {
        let mut input = event.into_input();

        if input.machine_name.is_none() || input.location.is_none() {
            if let Some(machine_id) = &input.machine_id {
                let state = self.state.lock().await;
                if let Some(machine) = state.machine(machine_id) {
                    if input.machine_name.is_none() {
                        input.machine_name = Some(machine.display_name().to_string());
                    }
                    if input.location.is_none() {
                        input.location = machine.location.clone();
                    }
                }
            }
        }

        let outcome = {
            let mut store = self.store.lock().await;
            store.add_notification(input)
        };

        match outcome {
            AddOutcome::Added {
                record,
                toast,
                reload_first_page,
            } => {
                self.ui.toast(toast).await;
                if let Some(cue) = SoundCue::for_kind(record.kind) {
                    self.ui.play(cue).await;
                }
                if reload_first_page {
                    let mut store = self.store.lock().await;
                    if let Err(e) = store.load_from_server(&self.api, 1).await {
                        tracing::warn!("Feed reload after live event failed: {e}");
                    }
                }
            }
            AddOutcome::Duplicate => {
                tracing::trace!("Event already in feed, skipped");
            }
            AddOutcome::OutOfScope | AddOutcome::Invalid => {}
        }
    }

    // ── Refresh ─────────────────────────────────────────────────

    /// Full dashboard data refresh: directory and coin tallies. Network
    /// failures keep stale data; authorization failures surface logout
    /// and are not retried.
    pub async fn refresh_dashboard_data(&self) {
        match self.api.get_machines().await {
            Ok(machines) => {
                let visible = filter_machines_for_role(machines, &self.scope);
                self.with_state(|state| state.set_machines(visible)).await;
            }
            Err(e) if e.is_auth_failure() => {
                self.surface_logout(&e);
                return;
            }
            Err(e) => {
                tracing::warn!("Machine directory refresh failed: {e}");
            }
        }

        match self.api.get_coins_by_machine().await {
            Ok(rows) => {
                let total = match self.api.get_total_coins().await {
                    Ok(total) => total,
                    Err(e) => {
                        tracing::debug!("Coin total fetch failed: {e}");
                        rows.iter().map(|r| r.total_coins).sum()
                    }
                };
                self.with_state(|state| state.set_coin_totals(rows, total)).await;
            }
            Err(e) if e.is_auth_failure() => {
                self.surface_logout(&e);
            }
            Err(e) => {
                tracing::warn!("Coin tally refresh failed: {e}");
            }
        }
    }

    fn surface_logout(&self, error: &machinehub_core::AppError) {
        if !*self.logged_out.borrow() {
            tracing::warn!("Session rejected by backend, surfacing logout: {error}");
            self.logged_out.send_replace(true);
        }
    }

    // ── Usage ───────────────────────────────────────────────────

    /// Fetch and derive today's usage for one machine.
    pub async fn load_usage(
        &self,
        machine_id: &machinehub_core::types::MachineId,
    ) -> machinehub_core::AppResult<MachineUsage> {
        let now = chrono::Utc::now();
        let logs = self
            .api
            .get_power_logs(machine_id, Some(time::start_of_today_utc()), Some(now))
            .await?;
        Ok(derive_usage(&logs, now))
    }

    // ── Push subscription ───────────────────────────────────────

    /// Register this agent for push delivery: fetch and validate the
    /// VAPID key, then register a subscription with the backend.
    async fn init_push_subscription(&self) -> machinehub_core::AppResult<()> {
        use base64::Engine;

        let Some(vapid) = self.api.get_vapid_public_key().await? else {
            tracing::info!("Backend has no VAPID key, skipping push subscription");
            return Ok(());
        };

        // VAPID keys arrive URL-safe base64 without padding; a key that
        // does not decode would be rejected by the gateway anyway.
        if base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(vapid.trim_end_matches('='))
            .is_err()
        {
            tracing::warn!("Backend VAPID key is not valid base64, skipping push subscription");
            return Ok(());
        }

        let agent_id = Uuid::new_v4();
        let subscription = PushSubscription {
            endpoint: format!("{}/push/agent/{agent_id}", self.api.base_url()),
            keys: PushSubscriptionKeys {
                p256dh: vapid,
                auth: agent_id.simple().to_string(),
            },
        };
        self.api.subscribe_push(&subscription).await?;
        tracing::info!("Push subscription registered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use serde_json::json;

    use machinehub_core::config::api::ApiConfig;
    use machinehub_core::events::normalize;
    use machinehub_store::{Toast, keys};

    #[derive(Default)]
    struct RecordingUi {
        toasts: StdMutex<Vec<Toast>>,
        cues: StdMutex<Vec<SoundCue>>,
    }

    #[async_trait]
    impl UiSink for RecordingUi {
        async fn toast(&self, toast: Toast) {
            self.toasts.lock().unwrap().push(toast);
        }

        async fn play(&self, cue: SoundCue) {
            self.cues.lock().unwrap().push(cue);
        }
    }

    fn dashboard(role: &str, assigned: &str) -> (Arc<Dashboard>, Arc<RecordingUi>) {
        let storage = Arc::new(DeviceStorage::in_memory());
        storage.set(keys::ROLE, role);
        storage.set(keys::ASSIGNED_MACHINE_IDS, assigned);

        // Unreachable backend: refreshes fail fast and keep stale state.
        let api_config = ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..ApiConfig::default()
        };
        let api = Arc::new(ApiClient::new(&api_config).unwrap());
        let ui = Arc::new(RecordingUi::default());
        let dashboard = Arc::new(Dashboard::new(
            AgentConfig::default(),
            api,
            storage,
            ui.clone(),
        ));
        (dashboard, ui)
    }

    fn coin_event(machine: &str) -> NormalizedEvent {
        normalize(&json!({
            "type": "coin_inserted",
            "machine_id": machine,
            "data": {"cantidad": 1}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_relay_event_ignored_while_visible() {
        let (dashboard, ui) = dashboard("admin", "[]");
        dashboard.set_visible(true);

        dashboard
            .handle_relay(RelayEnvelope::new(RelayMessage::EventNotification(
                coin_event("5"),
            )))
            .await;

        assert_eq!(dashboard.with_store(|s| s.records().len()).await, 0);
        assert!(ui.toasts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_relay_event_appended_while_hidden() {
        let (dashboard, ui) = dashboard("admin", "[]");
        dashboard.set_visible(false);

        dashboard
            .handle_relay(RelayEnvelope::new(RelayMessage::EventNotification(
                coin_event("5"),
            )))
            .await;

        assert_eq!(dashboard.with_store(|s| s.records().len()).await, 1);
        assert_eq!(dashboard.unread_count().await, 1);
        assert_eq!(ui.toasts.lock().unwrap().len(), 1);
        assert_eq!(ui.cues.lock().unwrap().as_slice(), &[SoundCue::Coin]);
    }

    #[tokio::test]
    async fn test_relay_event_respects_scope_while_hidden() {
        let (dashboard, _ui) = dashboard("employee", r#"["1"]"#);
        dashboard.set_visible(false);

        dashboard
            .handle_relay(RelayEnvelope::new(RelayMessage::EventNotification(
                coin_event("5"),
            )))
            .await;

        assert_eq!(dashboard.with_store(|s| s.records().len()).await, 0);
    }

    #[tokio::test]
    async fn test_relay_coin_cue_is_admin_only() {
        let (admin, admin_ui) = dashboard("admin", "[]");
        admin
            .handle_relay(RelayEnvelope::new(RelayMessage::CoinNotification(
                coin_event("5"),
            )))
            .await;
        assert_eq!(admin_ui.cues.lock().unwrap().as_slice(), &[SoundCue::Coin]);

        let (employee, employee_ui) = dashboard("employee", r#"["5"]"#);
        employee
            .handle_relay(RelayEnvelope::new(RelayMessage::CoinNotification(
                coin_event("5"),
            )))
            .await;
        assert!(employee_ui.cues.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_live_event_updates_feed_and_tallies() {
        let (dashboard, ui) = dashboard("admin", "[]");

        let event = normalize(&json!({
            "type": "machine_off",
            "machine_id": "7",
            "data": {"reason": "power_failure"}
        }))
        .unwrap();
        // Machine 7 is unknown; the refresh this triggers fails against
        // the unreachable test backend and keeps stale (empty) state.
        dashboard.handle_live_event(event).await;

        let record = dashboard.with_store(|s| s.records()[0].clone()).await;
        assert_eq!(record.kind, EventKind::MachineOff);
        assert_eq!(record.detail.as_deref(), Some("power_failure"));
        assert_eq!(dashboard.unread_count().await, 1);
        assert_eq!(
            ui.cues.lock().unwrap().as_slice(),
            &[SoundCue::MachineOff]
        );
    }
}
