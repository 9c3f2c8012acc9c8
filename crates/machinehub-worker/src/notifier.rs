//! Per-push-message processing.
//!
//! Each delivery walks `Received → Parsing → {Parsed | FallbackFetch} →
//! Rendering → Done`. Parse failures are never fatal: the worker either
//! reconstructs an event from the latest-events endpoint or suppresses
//! the notification cleanly.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing;

use machinehub_api::ApiClient;
use machinehub_core::config::notifications::NotificationsConfig;
use machinehub_core::config::push::PushConfig;
use machinehub_core::events::{self, NormalizedEvent, PushPayload};
use machinehub_core::result::AppResult;
use machinehub_core::types::EventKind;
use machinehub_realtime::{PushMessage, RelayBus, RelayMessage};

use crate::render::{self, RenderedNotification};
use crate::sink::NotificationSink;

/// Source of the single bounded fallback fetch.
///
/// A seam so the notifier can be exercised without a backend.
#[async_trait]
pub trait LatestEventSource: Send + Sync {
    /// Fetch the most recent fleet event, if any.
    async fn latest_event(&self) -> AppResult<Option<NormalizedEvent>>;
}

#[async_trait]
impl LatestEventSource for ApiClient {
    async fn latest_event(&self) -> AppResult<Option<NormalizedEvent>> {
        ApiClient::latest_event(self).await
    }
}

/// Terminal state of one push delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The sender's own display text was rendered.
    RenderedFromPayload,
    /// A fallback-fetched event was rendered.
    RenderedFromFallback,
    /// Nothing was rendered; the reason is routine, not an error.
    Suppressed(SuppressReason),
}

/// Why a delivery rendered nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// No payload and the fallback returned no event.
    NoEvent,
    /// The event kind is unknown; generic notifications are never shown.
    UnknownKind,
    /// The platform sink rejected the notification.
    SinkFailed,
}

/// Background worker notifier.
pub struct PushNotifier {
    /// Source for the bounded fallback fetch.
    fallback_source: Arc<dyn LatestEventSource>,
    /// Relay to open foreground instances.
    relay: RelayBus,
    /// Platform notification sink.
    sink: Arc<dyn NotificationSink>,
    /// Tag prefix for rendered notifications.
    tag_prefix: String,
    /// Upper bound on the fallback fetch.
    fallback_timeout: Duration,
}

impl PushNotifier {
    /// Create a notifier.
    pub fn new(
        fallback_source: Arc<dyn LatestEventSource>,
        relay: RelayBus,
        sink: Arc<dyn NotificationSink>,
        notifications: &NotificationsConfig,
        push: &PushConfig,
    ) -> Self {
        Self {
            fallback_source,
            relay,
            sink,
            tag_prefix: notifications.tag_prefix.clone(),
            fallback_timeout: Duration::from_secs(push.fallback_timeout_seconds),
        }
    }

    /// Process one push delivery to completion.
    pub async fn handle_push(&self, message: PushMessage) -> PushOutcome {
        // Parsing
        let payload = events::parse_push_body(&message.body);

        match payload {
            Some(payload) if payload.has_display_text() => {
                // Parsed: the sender supplied display text.
                self.relay_event(payload.event.as_ref());
                let rendered = render::render_payload(&payload, &self.tag_prefix);
                self.show(rendered, PushOutcome::RenderedFromPayload).await
            }
            other => {
                // FallbackFetch: reconstruct a best-effort notification.
                if other.is_none() {
                    tracing::debug!("Push body unparseable, falling back to latest event");
                }
                self.fallback(other).await
            }
        }
    }

    async fn fallback(&self, parsed: Option<PushPayload>) -> PushOutcome {
        let fetched = tokio::time::timeout(
            self.fallback_timeout,
            self.fallback_source.latest_event(),
        )
        .await;

        let event = match fetched {
            Ok(Ok(event)) => event,
            Ok(Err(e)) => {
                tracing::debug!("Push fallback fetch failed: {e}");
                None
            }
            Err(_) => {
                tracing::debug!("Push fallback fetch timed out");
                None
            }
        };

        // When the fetch comes back empty the parsed payload may still
        // carry usable event data.
        let event = event.or(parsed.and_then(|p| p.event));

        let Some(event) = event else {
            // No payload, no fallback event: suppress entirely rather
            // than show a placeholder.
            return PushOutcome::Suppressed(SuppressReason::NoEvent);
        };

        match render::render_event(&event, &self.tag_prefix) {
            Some(rendered) => {
                self.relay_event(Some(&event));
                self.show(rendered, PushOutcome::RenderedFromFallback).await
            }
            None => {
                tracing::debug!(kind = %event.kind, "Suppressed notification for unknown kind");
                PushOutcome::Suppressed(SuppressReason::UnknownKind)
            }
        }
    }

    async fn show(&self, rendered: RenderedNotification, ok: PushOutcome) -> PushOutcome {
        match self.sink.show(rendered).await {
            Ok(()) => ok,
            Err(e) => {
                tracing::warn!("Notification sink failed: {e}");
                PushOutcome::Suppressed(SuppressReason::SinkFailed)
            }
        }
    }

    /// Broadcast the normalized payload so open foreground instances can
    /// update counters and play sounds. The worker has no access to
    /// foreground state; this relay is the only channel.
    fn relay_event(&self, event: Option<&NormalizedEvent>) {
        let Some(event) = event else {
            return;
        };
        if event.kind == EventKind::CoinInserted {
            self.relay
                .publish(RelayMessage::CoinNotification(event.clone()));
        }
        self.relay
            .publish(RelayMessage::EventNotification(event.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use machinehub_core::AppError;
    use machinehub_core::events::normalize;

    struct StubSource {
        result: Mutex<Option<AppResult<Option<NormalizedEvent>>>>,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn returning(result: AppResult<Option<NormalizedEvent>>) -> Arc<Self> {
            Arc::new(Self {
                result: Mutex::new(Some(result)),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LatestEventSource for StubSource {
        async fn latest_event(&self) -> AppResult<Option<NormalizedEvent>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Ok(None))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        shown: Mutex<Vec<RenderedNotification>>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn show(&self, notification: RenderedNotification) -> AppResult<()> {
            self.shown.lock().unwrap().push(notification);
            Ok(())
        }
    }

    fn notifier(
        source: Arc<StubSource>,
        sink: Arc<RecordingSink>,
        relay: RelayBus,
    ) -> PushNotifier {
        PushNotifier::new(
            source,
            relay,
            sink,
            &NotificationsConfig::default(),
            &PushConfig::default(),
        )
    }

    fn coin_event() -> NormalizedEvent {
        normalize(&json!({
            "type": "coin_inserted",
            "machine_id": "5",
            "data": {"cantidad": 3}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_empty_body_and_empty_fallback_render_nothing() {
        let source = StubSource::returning(Ok(None));
        let sink = Arc::new(RecordingSink::default());
        let n = notifier(source.clone(), sink.clone(), RelayBus::new(8));

        let outcome = n.handle_push(PushMessage::empty()).await;

        assert_eq!(outcome, PushOutcome::Suppressed(SuppressReason::NoEvent));
        assert!(sink.shown.lock().unwrap().is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fallback_failure_is_silent() {
        let source = StubSource::returning(Err(AppError::network("down")));
        let sink = Arc::new(RecordingSink::default());
        let n = notifier(source, sink.clone(), RelayBus::new(8));

        let outcome = n.handle_push(PushMessage::empty()).await;

        assert_eq!(outcome, PushOutcome::Suppressed(SuppressReason::NoEvent));
        assert!(sink.shown.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_body_renders_fallback_event() {
        let source = StubSource::returning(Ok(Some(coin_event())));
        let sink = Arc::new(RecordingSink::default());
        let relay = RelayBus::new(8);
        let mut relay_rx = relay.subscribe();
        let n = notifier(source, sink.clone(), relay);

        let outcome = n.handle_push(PushMessage::empty()).await;

        assert_eq!(outcome, PushOutcome::RenderedFromFallback);
        let shown = sink.shown.lock().unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "Moneda ingresada");
        assert!(shown[0].body.contains("Máquina 5 recibió 3 moneda(s)"));

        // Coin events relay both message variants.
        let first = relay_rx.try_recv().unwrap();
        assert!(matches!(first.message, RelayMessage::CoinNotification(_)));
        let second = relay_rx.try_recv().unwrap();
        assert!(matches!(second.message, RelayMessage::EventNotification(_)));
    }

    #[tokio::test]
    async fn test_payload_with_display_text_skips_fallback() {
        let source = StubSource::returning(Ok(Some(coin_event())));
        let sink = Arc::new(RecordingSink::default());
        let n = notifier(source.clone(), sink.clone(), RelayBus::new(8));

        let body = br#"{"title":"Moneda ingresada","body":"Boxeo A +1","data":{"type":"coin_inserted","machine_id":"5"}}"#;
        let outcome = n.handle_push(PushMessage::new(body.to_vec())).await;

        assert_eq!(outcome, PushOutcome::RenderedFromPayload);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(sink.shown.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_fallback_kind_is_suppressed_and_not_relayed() {
        let unknown = normalize(&json!({"type": "telemetry", "machine_id": "9"})).unwrap();
        let source = StubSource::returning(Ok(Some(unknown)));
        let sink = Arc::new(RecordingSink::default());
        let relay = RelayBus::new(8);
        let mut relay_rx = relay.subscribe();
        let n = notifier(source, sink.clone(), relay);

        let outcome = n.handle_push(PushMessage::empty()).await;

        assert_eq!(outcome, PushOutcome::Suppressed(SuppressReason::UnknownKind));
        assert!(sink.shown.lock().unwrap().is_empty());
        assert!(relay_rx.try_recv().is_err());
    }
}
