//! Coalescing of inbound event JSON into the canonical shape.
//!
//! The backend and its revisions mix key casings (`machineId` vs
//! `machine_id`, `timestamp` vs `ts`) and nest coin counts and power-off
//! reasons under `data.cantidad` / `data.reason`. All of that tolerance
//! lives here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::time;
use crate::types::{EventKind, MachineId, NotificationInput, NotificationRecord};

/// A fully normalized event, ready to become a [`NotificationRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// Server-assigned id, when the event came from history.
    pub server_id: Option<u64>,
    /// Event kind; unrecognized wire types map to [`EventKind::Other`].
    pub kind: EventKind,
    /// Machine the event belongs to.
    pub machine_id: MachineId,
    /// Display name, when the wire shape carried one.
    pub machine_name: Option<String>,
    /// Location label, when carried.
    pub location: Option<String>,
    /// Event instant; invalid wire timestamps become "now".
    pub timestamp: DateTime<Utc>,
    /// Coin count; `Some` only for `CoinInserted`, defaulted to 1.
    pub amount: Option<u32>,
    /// Power-off reason or similar, only when present and non-empty.
    pub detail: Option<String>,
}

impl NormalizedEvent {
    /// Convert into a store input.
    pub fn into_input(self) -> NotificationInput {
        NotificationInput {
            kind: Some(self.kind),
            machine_id: Some(self.machine_id),
            machine_name: self.machine_name,
            location: self.location,
            timestamp: Some(self.timestamp),
            amount: self.amount,
            detail: self.detail,
        }
    }

    /// Convert into a record under the given session id.
    pub fn into_record(self, id: u64) -> NotificationRecord {
        let machine_name = self
            .machine_name
            .unwrap_or_else(|| NotificationRecord::default_name(&self.machine_id));
        NotificationRecord {
            id,
            kind: self.kind,
            machine_id: self.machine_id,
            machine_name,
            location: self.location,
            timestamp: self.timestamp,
            amount: self.amount,
            detail: self.detail,
        }
    }
}

/// Normalize one inbound event value.
///
/// Returns `None` when no machine id can be resolved; such events are
/// invalid and silently dropped by every caller (routine filtering, not
/// an error).
pub fn normalize(value: &Value) -> Option<NormalizedEvent> {
    normalize_with_hint(value, None)
}

/// Normalize with an out-of-band kind hint.
///
/// Live socket frames name the event at the frame level; the hint fills
/// in when the payload itself carries no type field. An explicit payload
/// type always wins.
pub fn normalize_with_hint(value: &Value, kind_hint: Option<EventKind>) -> Option<NormalizedEvent> {
    let machine_id = MachineId::parse(string_field(value, &["machine_id", "machineId"])?)?;

    let kind = string_field(value, &["type", "eventType", "event"])
        .map(|s| s.parse().unwrap_or(EventKind::Other))
        .or(kind_hint)
        .unwrap_or(EventKind::Other);

    let timestamp = time::parse_or_now(
        string_field(value, &["timestamp", "ts"]).as_deref(),
    );

    let amount = if kind == EventKind::CoinInserted {
        let raw = u32_field(value, &["amount", "cantidad"])
            .or_else(|| value.get("data").and_then(|d| u32_field(d, &["cantidad", "amount"])));
        Some(raw.filter(|n| *n > 0).unwrap_or(1))
    } else {
        None
    };

    let detail = value
        .get("data")
        .and_then(|d| d.get("reason"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Some(NormalizedEvent {
        server_id: u64_field(value, &["id"]),
        kind,
        machine_id,
        machine_name: string_field(value, &["machine_name", "machineName"])
            .filter(|s| !s.is_empty()),
        location: string_field(value, &["location"]).filter(|s| !s.is_empty()),
        timestamp,
        amount,
        detail,
    })
}

/// First present key, coerced to a string. Numbers coerce so numeric
/// machine ids survive.
fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match value.get(key) {
            Some(Value::String(s)) => return Some(s.trim().to_string()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => continue,
        }
    }
    None
}

/// First present key, coerced to `u32`. Numeric strings and floats with
/// integral values are accepted.
fn u32_field(value: &Value, keys: &[&str]) -> Option<u32> {
    u64_field(value, keys).and_then(|n| u32::try_from(n).ok())
}

fn u64_field(value: &Value, keys: &[&str]) -> Option<u64> {
    for key in keys {
        let found = match value.get(key) {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snake_and_camel_case_coalesce() {
        let snake = normalize(&json!({
            "type": "machine_on",
            "machine_id": "7",
            "timestamp": "2026-03-01T12:00:00Z"
        }))
        .unwrap();
        let camel = normalize(&json!({
            "eventType": "machine_on",
            "machineId": 7,
            "ts": "2026-03-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(snake, camel);
        assert_eq!(snake.kind, EventKind::MachineOn);
        assert_eq!(snake.machine_id.as_str(), "7");
    }

    #[test]
    fn test_missing_machine_id_is_dropped() {
        assert!(normalize(&json!({"type": "coin_inserted"})).is_none());
        assert!(normalize(&json!({"type": "coin_inserted", "machine_id": ""})).is_none());
    }

    #[test]
    fn test_coin_amount_from_nested_cantidad() {
        let ev = normalize(&json!({
            "type": "coin_inserted",
            "machine_id": "5",
            "data": {"cantidad": 3}
        }))
        .unwrap();
        assert_eq!(ev.amount, Some(3));
    }

    #[test]
    fn test_coin_amount_defaults_to_one() {
        for payload in [
            json!({"type": "coin_inserted", "machine_id": "5"}),
            json!({"type": "coin_inserted", "machine_id": "5", "amount": "not a number"}),
            json!({"type": "coin_inserted", "machine_id": "5", "amount": 0}),
        ] {
            let ev = normalize(&payload).unwrap();
            assert_eq!(ev.amount, Some(1), "payload: {payload}");
        }
    }

    #[test]
    fn test_amount_absent_for_power_events() {
        let ev = normalize(&json!({
            "type": "machine_on",
            "machine_id": "5",
            "amount": 4
        }))
        .unwrap();
        assert_eq!(ev.amount, None);
    }

    #[test]
    fn test_detail_requires_non_empty_reason() {
        let with = normalize(&json!({
            "type": "machine_off",
            "machine_id": "7",
            "data": {"reason": "power_failure"}
        }))
        .unwrap();
        assert_eq!(with.detail.as_deref(), Some("power_failure"));

        let empty = normalize(&json!({
            "type": "machine_off",
            "machine_id": "7",
            "data": {"reason": "  "}
        }))
        .unwrap();
        assert_eq!(empty.detail, None);
    }

    #[test]
    fn test_invalid_timestamp_normalizes_to_now() {
        let before = Utc::now();
        let ev = normalize(&json!({
            "type": "machine_on",
            "machine_id": "1",
            "timestamp": "yesterday-ish"
        }))
        .unwrap();
        assert!(ev.timestamp >= before);
    }

    #[test]
    fn test_unknown_type_becomes_other() {
        let ev = normalize(&json!({"type": "telemetry", "machine_id": "1"})).unwrap();
        assert_eq!(ev.kind, EventKind::Other);
        // Missing type entirely also falls back.
        let no_type = normalize(&json!({"machine_id": "1"})).unwrap();
        assert_eq!(no_type.kind, EventKind::Other);
    }

    #[test]
    fn test_server_id_extraction() {
        let ev = normalize(&json!({"id": 41, "type": "machine_on", "machine_id": "2"})).unwrap();
        assert_eq!(ev.server_id, Some(41));
        let record = ev.into_record(41);
        assert_eq!(record.machine_name, "Máquina 2");
    }
}
