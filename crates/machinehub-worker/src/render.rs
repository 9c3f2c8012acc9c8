//! Notification rendering rules.
//!
//! Computes the platform notification options for an event: title, body,
//! icon, vibration pattern, dismissal behavior, and the replacement tag.

use machinehub_core::events::{NormalizedEvent, PushPayload};
use machinehub_core::time;
use machinehub_core::types::EventKind;

/// Icon shown on every rendered notification.
const ICON_PATH: &str = "/img/icons/K11BOX.webp";

/// Short vibration for routine events.
const VIBRATE_DEFAULT: [u32; 3] = [100, 50, 100];
/// Long vibration for power-off events.
const VIBRATE_HIGH: [u32; 3] = [300, 100, 300];

/// Fully computed platform notification.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNotification {
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
    /// Icon path.
    pub icon: String,
    /// Badge path.
    pub badge: String,
    /// Vibration pattern in milliseconds.
    pub vibration: Vec<u32>,
    /// Replacement tag. Repeats with the same tag replace the visible
    /// notification instead of stacking.
    pub tag: String,
    /// Whether a replaced notification alerts again.
    pub renotify: bool,
    /// Whether the notification stays until explicitly dismissed.
    pub require_interaction: bool,
}

/// Render an event the worker reconstructed itself (fallback fetch).
///
/// Returns `None` for unknown kinds: a generic "new event" notification
/// is deliberately never shown.
pub fn render_event(event: &NormalizedEvent, tag_prefix: &str) -> Option<RenderedNotification> {
    let (title, body) = match event.kind {
        EventKind::CoinInserted => {
            let body = match event.amount {
                Some(n) if n > 1 => {
                    format!("Máquina {} recibió {} moneda(s)", event.machine_id, n)
                }
                Some(_) => format!("Máquina {} recibió 1 moneda(s)", event.machine_id),
                None => format!("Máquina {} registró una moneda", event.machine_id),
            };
            ("Moneda ingresada".to_string(), body)
        }
        EventKind::MachineOn | EventKind::MachineOff => {
            let title = if event.kind == EventKind::MachineOn {
                "Máquina encendida"
            } else {
                "Máquina apagada"
            };
            let mut body = event.machine_id.to_string();
            if let Some(reason) = &event.detail {
                body.push_str(&format!(" — {reason}"));
            }
            (title.to_string(), body)
        }
        EventKind::Other => return None,
    };

    Some(finish(title, body, Some(event), tag_prefix))
}

/// Render a push payload that carried its own display text.
pub fn render_payload(payload: &PushPayload, tag_prefix: &str) -> RenderedNotification {
    let title = payload
        .title
        .clone()
        .unwrap_or_else(|| "MachineHub".to_string());
    let body = payload.body.clone().unwrap_or_default();
    finish(title, body, payload.event.as_ref(), tag_prefix)
}

fn finish(
    title: String,
    mut body: String,
    event: Option<&NormalizedEvent>,
    tag_prefix: &str,
) -> RenderedNotification {
    let kind = event.map(|e| e.kind);

    // Append the localized event time so the notification shows when the
    // event happened, not when it was delivered.
    if let Some(event) = event {
        let time_str = time::format_notification_datetime(&event.timestamp);
        if body.is_empty() {
            body = time_str;
        } else if !body.contains(&time_str) {
            body = format!("{body} • {time_str}");
        }
    }

    let high_priority = kind.is_some_and(|k| k.is_high_priority());
    let vibration = if high_priority {
        VIBRATE_HIGH.to_vec()
    } else {
        VIBRATE_DEFAULT.to_vec()
    };

    // Tag granularity is per kind *and* machine: repeats for one machine
    // collapse, but two machines never replace each other's notification.
    let tag = match event {
        Some(event) => format!("{tag_prefix}-{}-{}", event.kind, event.machine_id),
        None => format!("{tag_prefix}-event"),
    };

    RenderedNotification {
        title,
        body,
        icon: ICON_PATH.to_string(),
        badge: ICON_PATH.to_string(),
        vibration,
        tag,
        renotify: true,
        require_interaction: high_priority,
    }
}
