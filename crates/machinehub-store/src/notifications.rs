//! The foreground notification store.
//!
//! Maintains the ordered, scope-filtered, deduplicated notification feed
//! shown in the dashboard: unread tracking against the persisted cursor,
//! server-backed or client-side pagination, and the single enforcement
//! point that keeps out-of-scope events invisible no matter which path
//! delivered them.

use std::sync::Arc;

use chrono::Utc;
use tracing;

use machinehub_api::{ApiClient, EventPage, EventQuery};
use machinehub_core::access::AccessScope;
use machinehub_core::config::notifications::NotificationsConfig;
use machinehub_core::result::AppResult;
use machinehub_core::time;
use machinehub_core::types::{
    EventKind, NotificationInput, NotificationRecord, PageRequest, PageResponse,
};

use crate::dedup::DedupIndex;
use crate::device::DeviceStorage;
use crate::keys;

/// Transient toast data for an appended record.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    /// Toast title.
    pub title: String,
    /// Toast body.
    pub body: String,
    /// Kind of the underlying event, for styling and sound selection.
    pub kind: EventKind,
    /// Auto-dismiss duration in milliseconds.
    pub duration_ms: u64,
}

/// Result of [`NotificationStore::add_notification`].
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// The record was appended.
    Added {
        /// The appended record.
        record: NotificationRecord,
        /// Toast to show.
        toast: Toast,
        /// Whether the server-backed first page should be reloaded so
        /// the open panel reflects the new event.
        reload_first_page: bool,
    },
    /// Dropped: the machine is outside the session's scope. Routine
    /// filtering, by design silent.
    OutOfScope,
    /// Dropped: the same physical event was already appended via the
    /// other delivery path.
    Duplicate,
    /// Dropped: no resolvable machine id.
    Invalid,
}

/// The notification feed.
pub struct NotificationStore {
    config: NotificationsConfig,
    scope: AccessScope,
    storage: Arc<DeviceStorage>,
    /// Records, newest first.
    records: Vec<NotificationRecord>,
    dedup: DedupIndex,
    /// Next locally-generated record id.
    next_local_id: u64,
    unread: u64,
    /// Current page (1-based).
    page: u64,
    /// Total pages reported by the server, when known.
    server_total_pages: Option<u64>,
    /// Total events reported by the server, when known.
    server_total: Option<u64>,
    /// Whether the notifications panel is open (new records are
    /// implicitly seen).
    viewing_panel: bool,
    /// Feed filter: today only, or an explicit local date range.
    today_only: bool,
    from: Option<String>,
    to: Option<String>,
}

impl NotificationStore {
    /// Create an empty store.
    pub fn new(
        config: NotificationsConfig,
        scope: AccessScope,
        storage: Arc<DeviceStorage>,
    ) -> Self {
        let dedup = DedupIndex::new(config.dedup_window_ms);
        Self {
            config,
            scope,
            storage,
            records: Vec::new(),
            dedup,
            next_local_id: 1,
            unread: 0,
            page: 1,
            server_total_pages: None,
            server_total: None,
            viewing_panel: false,
            today_only: true,
            from: None,
            to: None,
        }
    }

    // ── Appending ───────────────────────────────────────────────

    /// Append one record.
    ///
    /// This is the single scope-enforcement point: events for machines
    /// outside the session's assignment are dropped here even when a
    /// lower layer already received them.
    pub fn add_notification(&mut self, input: NotificationInput) -> AddOutcome {
        let Some(machine_id) = input.machine_id else {
            return AddOutcome::Invalid;
        };
        if !self.scope.can_access(&machine_id) {
            return AddOutcome::OutOfScope;
        }

        let kind = input.kind.unwrap_or(EventKind::Other);
        let timestamp = input.timestamp.unwrap_or_else(Utc::now);

        if !self.dedup.insert(&machine_id, kind, &timestamp) {
            tracing::trace!(%machine_id, %kind, "Duplicate event dropped");
            return AddOutcome::Duplicate;
        }

        let amount = if kind == EventKind::CoinInserted {
            Some(input.amount.filter(|n| *n > 0).unwrap_or(1))
        } else {
            None
        };

        let record = NotificationRecord {
            id: self.take_local_id(),
            kind,
            machine_name: input
                .machine_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| NotificationRecord::default_name(&machine_id)),
            machine_id,
            location: input.location,
            timestamp,
            amount,
            detail: input.detail,
        };

        self.records.insert(0, record.clone());

        if !self.viewing_panel {
            self.unread += 1;
        }

        let toast = self.build_toast(&record);
        let reload_first_page = self.server_total_pages.is_some() && self.viewing_panel;

        AddOutcome::Added {
            record,
            toast,
            reload_first_page,
        }
    }

    fn take_local_id(&mut self) -> u64 {
        let id = self.next_local_id;
        self.next_local_id += 1;
        id
    }

    fn build_toast(&self, record: &NotificationRecord) -> Toast {
        let time_str = time::format_notification_time(&record.timestamp);
        let body = match record.kind {
            EventKind::CoinInserted => {
                let amount = record.amount.unwrap_or(1);
                format!("{} • +{amount} moneda(s) • {time_str}", record.machine_name)
            }
            _ => {
                let mut body = format!("{} • {time_str}", record.machine_name);
                if let Some(detail) = &record.detail {
                    body.push_str(&format!(" • {detail}"));
                }
                body
            }
        };
        Toast {
            title: title_for(record.kind).to_string(),
            body,
            kind: record.kind,
            duration_ms: self.config.toast_duration_ms,
        }
    }

    // ── Server history ──────────────────────────────────────────

    /// Query for the given page under the current date-range filter.
    pub fn build_query(&self, page: u64) -> EventQuery {
        let (start, end) = if self.today_only {
            (Some(time::start_of_today_utc()), Some(Utc::now()))
        } else {
            time::local_date_range_utc(self.from.as_deref(), self.to.as_deref())
        };
        EventQuery::bounded(start, end, PageRequest::new(page, self.config.page_size))
    }

    /// Fetch and apply one page of history.
    pub async fn load_from_server(&mut self, api: &ApiClient, page: u64) -> AppResult<()> {
        let page_data = api.get_events(&self.build_query(page)).await?;
        self.apply_page(page_data);
        Ok(())
    }

    /// Replace the in-memory page with a server page.
    ///
    /// The scope filter is re-applied client-side as defense in depth
    /// against a server that over-returns. The local id counter advances
    /// past the maximum server id so live events never collide.
    pub fn apply_page(&mut self, page: EventPage) {
        let mut records: Vec<NotificationRecord> = Vec::with_capacity(page.events.len());
        for event in page.events {
            if !self.scope.can_access(&event.machine_id) {
                continue;
            }
            let id = match event.server_id {
                Some(id) => id,
                None => self.take_local_id(),
            };
            records.push(event.into_record(id));
        }

        let max_id = records.iter().map(|r| r.id).max().unwrap_or(0);
        self.next_local_id = self.next_local_id.max(max_id + 1);

        self.records = records;
        self.server_total_pages = Some(page.total_pages.max(1));
        self.server_total = Some(page.total);
        self.page = page.page.max(1);
        self.recalc_unread_from_cursor();
    }

    // ── Unread tracking ─────────────────────────────────────────

    /// Persist cursor = now and zero the unread count.
    pub fn mark_seen(&mut self) {
        self.storage
            .set(keys::NOTIFICATIONS_LAST_SEEN, Utc::now().to_rfc3339());
        self.unread = 0;
    }

    /// Recompute the unread count from the persisted cursor.
    pub fn recalc_unread_from_cursor(&mut self) {
        let Some(cursor) = self
            .storage
            .get(keys::NOTIFICATIONS_LAST_SEEN)
            .as_deref()
            .and_then(time::parse)
        else {
            self.unread = 0;
            return;
        };
        self.unread = self
            .records
            .iter()
            .filter(|r| r.timestamp > cursor)
            .count() as u64;
    }

    /// Current unread count.
    pub fn unread_count(&self) -> u64 {
        self.unread
    }

    /// Mark the notifications panel open or closed. New records appended
    /// while the panel is open are implicitly seen.
    pub fn set_viewing_panel(&mut self, viewing: bool) {
        self.viewing_panel = viewing;
    }

    // ── Pagination ──────────────────────────────────────────────

    /// All records of the current page, newest first.
    pub fn records(&self) -> &[NotificationRecord] {
        &self.records
    }

    /// Total pages: server paging passes through when known, otherwise
    /// the in-memory list paginates client-side.
    pub fn total_pages(&self) -> u64 {
        if let Some(total) = self.server_total_pages {
            return total.max(1);
        }
        let len = self.records.len() as u64;
        (len.div_ceil(self.config.page_size)).max(1)
    }

    /// Current page number (1-based).
    pub fn page(&self) -> u64 {
        self.page
    }

    /// Select a page for client-side pagination.
    pub fn set_page(&mut self, page: u64) {
        self.page = page.clamp(1, self.total_pages());
    }

    /// The visible slice of the current page.
    pub fn paged(&self) -> &[NotificationRecord] {
        if self.server_total_pages.is_some() {
            return &self.records;
        }
        let size = self.config.page_size as usize;
        let start = ((self.page.saturating_sub(1)) as usize) * size;
        let end = (start + size).min(self.records.len());
        if start >= self.records.len() {
            return &[];
        }
        &self.records[start..end]
    }

    /// The current page as a response envelope for a UI layer.
    pub fn page_response(&self) -> PageResponse<NotificationRecord> {
        let total_items = self.server_total.unwrap_or(self.records.len() as u64);
        let mut response = PageResponse::new(
            self.paged().to_vec(),
            self.page,
            self.config.page_size,
            total_items,
        );
        // Server paging wins over the derived page count.
        if let Some(total_pages) = self.server_total_pages {
            response.total_pages = total_pages.max(1);
        }
        response
    }

    // ── Date-range preferences ──────────────────────────────────

    /// Restore persisted preferences.
    pub fn restore_preferences(&mut self) {
        match self.storage.get(keys::NOTIFICATIONS_TODAY).as_deref() {
            Some("true") | None => {
                self.today_only = true;
                self.from = None;
                self.to = None;
            }
            _ => {
                self.today_only = false;
                self.from = self.storage.get(keys::NOTIFICATIONS_FROM);
                self.to = self.storage.get(keys::NOTIFICATIONS_TO);
            }
        }
    }

    /// Switch to the "today only" filter. Resets to the first page; the
    /// caller reloads afterwards.
    pub fn set_today_only(&mut self) {
        self.today_only = true;
        self.from = None;
        self.to = None;
        self.page = 1;
        self.persist_preferences();
    }

    /// Switch to an explicit local date range (`YYYY-MM-DD` bounds).
    pub fn set_range(&mut self, from: Option<String>, to: Option<String>) {
        self.today_only = false;
        self.from = from;
        self.to = to;
        self.page = 1;
        self.persist_preferences();
    }

    fn persist_preferences(&self) {
        self.storage
            .set(keys::NOTIFICATIONS_TODAY, self.today_only.to_string());
        match &self.from {
            Some(from) => self.storage.set(keys::NOTIFICATIONS_FROM, from.clone()),
            None => self.storage.remove(keys::NOTIFICATIONS_FROM),
        }
        match &self.to {
            Some(to) => self.storage.set(keys::NOTIFICATIONS_TO, to.clone()),
            None => self.storage.remove(keys::NOTIFICATIONS_TO),
        }
    }
}

fn title_for(kind: EventKind) -> &'static str {
    match kind {
        EventKind::MachineOn => "Máquina encendida",
        EventKind::MachineOff => "Máquina apagada",
        EventKind::CoinInserted => "Moneda ingresada",
        EventKind::Other => "Nuevo evento",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;
    use serde_json::json;

    use machinehub_core::events::normalize;
    use machinehub_core::types::{MachineId, UserRole};

    fn mid(s: &str) -> MachineId {
        MachineId::parse(s).unwrap()
    }

    fn store_with_scope(scope: AccessScope) -> NotificationStore {
        NotificationStore::new(
            NotificationsConfig::default(),
            scope,
            Arc::new(DeviceStorage::in_memory()),
        )
    }

    fn admin_store() -> NotificationStore {
        store_with_scope(AccessScope::admin())
    }

    fn coin_input(machine: &str) -> NotificationInput {
        NotificationInput {
            kind: Some(EventKind::CoinInserted),
            machine_id: MachineId::parse(machine),
            amount: Some(1),
            ..NotificationInput::default()
        }
    }

    fn server_page(ids: &[u64]) -> EventPage {
        let events = ids
            .iter()
            .map(|id| {
                normalize(&json!({
                    "id": id,
                    "type": "coin_inserted",
                    "machine_id": "5",
                    "timestamp": "2026-03-01T12:00:00Z"
                }))
                .unwrap()
            })
            .collect::<Vec<_>>();
        let total = events.len() as u64;
        EventPage {
            events,
            total,
            page: 1,
            page_size: 20,
            total_pages: 1,
        }
    }

    #[test]
    fn test_out_of_scope_is_silently_dropped() {
        let scope = AccessScope::new(UserRole::Employee, vec![mid("1")]);
        let mut store = store_with_scope(scope);

        assert_eq!(store.add_notification(coin_input("2")), AddOutcome::OutOfScope);
        assert!(store.records().is_empty());
        assert_eq!(store.unread_count(), 0);

        assert!(matches!(
            store.add_notification(coin_input("1")),
            AddOutcome::Added { .. }
        ));
        assert_eq!(store.records().len(), 1);
    }

    #[test]
    fn test_missing_machine_id_is_invalid() {
        let mut store = admin_store();
        let input = NotificationInput {
            kind: Some(EventKind::CoinInserted),
            ..NotificationInput::default()
        };
        assert_eq!(store.add_notification(input), AddOutcome::Invalid);
    }

    #[test]
    fn test_same_event_via_both_paths_is_stored_once() {
        let mut store = admin_store();
        let ts = Utc::now();

        // Live channel delivery.
        let mut live = coin_input("5");
        live.timestamp = Some(ts);
        assert!(matches!(store.add_notification(live), AddOutcome::Added { .. }));

        // Worker relay delivery of the same physical event.
        let mut relayed = coin_input("5");
        relayed.timestamp = Some(ts);
        assert_eq!(store.add_notification(relayed), AddOutcome::Duplicate);

        assert_eq!(store.records().len(), 1);
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_mark_seen_then_one_new_record_increments_once() {
        let mut store = admin_store();
        store.add_notification(coin_input("5"));
        store.mark_seen();
        assert_eq!(store.unread_count(), 0);

        let mut later = coin_input("5");
        later.timestamp = Some(Utc::now() + Duration::seconds(5));
        store.add_notification(later);
        assert_eq!(store.unread_count(), 1);

        // Recomputing from the cursor agrees with the increment.
        store.recalc_unread_from_cursor();
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_viewing_panel_suppresses_unread_increment() {
        let mut store = admin_store();
        store.set_viewing_panel(true);
        store.add_notification(coin_input("5"));
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_apply_page_is_idempotent() {
        let mut store = admin_store();
        store.apply_page(server_page(&[40, 41, 42]));
        let first: Vec<_> = store.records().to_vec();

        store.apply_page(server_page(&[40, 41, 42]));
        assert_eq!(store.records(), first.as_slice());
        assert_eq!(store.total_pages(), 1);
    }

    #[test]
    fn test_local_ids_advance_past_server_ids() {
        let mut store = admin_store();
        store.apply_page(server_page(&[40, 41]));

        let outcome = store.add_notification(coin_input("5"));
        let AddOutcome::Added { record, .. } = outcome else {
            panic!("expected Added, got {outcome:?}");
        };
        assert_eq!(record.id, 42);
    }

    #[test]
    fn test_apply_page_refilters_out_of_scope_rows() {
        let scope = AccessScope::new(UserRole::Employee, vec![mid("7")]);
        let mut store = store_with_scope(scope);

        // Server over-returns machine 5 rows; none are visible.
        store.apply_page(server_page(&[1, 2]));
        assert!(store.records().is_empty());
    }

    #[test]
    fn test_client_side_pagination() {
        let mut store = admin_store();
        for i in 0..25 {
            let mut input = coin_input("5");
            input.timestamp = Some(Utc::now() + Duration::seconds(10 * i));
            store.add_notification(input);
        }
        assert_eq!(store.records().len(), 25);
        assert_eq!(store.total_pages(), 2);

        store.set_page(2);
        assert_eq!(store.paged().len(), 5);
        store.set_page(99);
        assert_eq!(store.page(), 2);

        let response = store.page_response();
        assert_eq!(response.total_pages, 2);
        assert_eq!(response.total_items, 25);
        assert_eq!(response.items.len(), 5);
    }

    #[test]
    fn test_toast_contents() {
        let mut store = admin_store();
        let mut input = coin_input("5");
        input.amount = Some(3);
        input.machine_name = Some("Boxeo A".to_string());
        let AddOutcome::Added { toast, .. } = store.add_notification(input) else {
            panic!("expected Added");
        };
        assert_eq!(toast.title, "Moneda ingresada");
        assert!(toast.body.starts_with("Boxeo A • +3 moneda(s)"));
    }

    #[test]
    fn test_preferences_round_trip() {
        let storage = Arc::new(DeviceStorage::in_memory());
        let mut store = NotificationStore::new(
            NotificationsConfig::default(),
            AccessScope::admin(),
            storage.clone(),
        );

        store.set_range(Some("2026-03-01".into()), Some("2026-03-05".into()));

        let mut second = NotificationStore::new(
            NotificationsConfig::default(),
            AccessScope::admin(),
            storage,
        );
        second.restore_preferences();
        let query = second.build_query(1);
        assert!(query.start_date.is_some());
        assert!(query.end_date.is_some());
    }
}
