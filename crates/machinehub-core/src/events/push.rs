//! Push message body parsing.

use serde_json::Value;

use super::normalizer::{NormalizedEvent, normalize};

/// A decoded push message body.
///
/// `title`/`body` come straight from the push envelope when the sender
/// provided display text; `event` is the normalized payload under `data`
/// (or, for older senders, the envelope itself).
#[derive(Debug, Clone, Default)]
pub struct PushPayload {
    /// Pre-rendered title, if the sender supplied one.
    pub title: Option<String>,
    /// Pre-rendered body, if the sender supplied one.
    pub body: Option<String>,
    /// Normalized event data.
    pub event: Option<NormalizedEvent>,
}

impl PushPayload {
    /// Whether the sender provided display text of its own.
    ///
    /// Payloads without any are reconstructed via the fallback fetch even
    /// when they carry event data, mirroring the backend's older senders.
    pub fn has_display_text(&self) -> bool {
        self.title.is_some() || self.body.is_some()
    }
}

/// Decode a push message body.
///
/// Returns `None` for empty or non-JSON bodies — a normal condition that
/// sends the worker to its fallback fetch, never an error.
pub fn parse_push_body(body: &[u8]) -> Option<PushPayload> {
    if body.is_empty() {
        return None;
    }
    let value: Value = serde_json::from_slice(body).ok()?;
    if !value.is_object() {
        return None;
    }

    let title = value
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|s| !s.is_empty());
    let body_text = value
        .get("body")
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|s| !s.is_empty());

    // Event data nests under `data`; older senders put the event fields
    // at the top level.
    let event = value
        .get("data")
        .and_then(normalize)
        .or_else(|| normalize(&value));

    Some(PushPayload {
        title,
        body: body_text,
        event,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventKind;

    #[test]
    fn test_empty_body_is_none() {
        assert!(parse_push_body(b"").is_none());
        assert!(parse_push_body(b"not json").is_none());
        assert!(parse_push_body(b"[1,2]").is_none());
    }

    #[test]
    fn test_nested_data_event() {
        let payload = parse_push_body(
            br#"{"title":"Moneda ingresada","data":{"type":"coin_inserted","machine_id":"5","data":{"cantidad":3}}}"#,
        )
        .unwrap();
        assert_eq!(payload.title.as_deref(), Some("Moneda ingresada"));
        let event = payload.event.unwrap();
        assert_eq!(event.kind, EventKind::CoinInserted);
        assert_eq!(event.amount, Some(3));
    }

    #[test]
    fn test_top_level_event_fallback() {
        let payload =
            parse_push_body(br#"{"type":"machine_off","machine_id":"7"}"#).unwrap();
        let event = payload.event.unwrap();
        assert_eq!(event.kind, EventKind::MachineOff);
        assert!(payload.title.is_none());
    }

    #[test]
    fn test_display_text_detection() {
        let text_only = parse_push_body(br#"{"title":"MachineHub","body":"hola"}"#).unwrap();
        assert!(text_only.event.is_none());
        assert!(text_only.has_display_text());

        // Event data without display text still needs the fallback fetch.
        let data_only =
            parse_push_body(br#"{"data":{"cantidad":3},"machine_id":"5"}"#).unwrap();
        assert!(!data_only.has_display_text());
        let event = data_only.event.unwrap();
        assert_eq!(event.machine_id.as_str(), "5");
    }
}
