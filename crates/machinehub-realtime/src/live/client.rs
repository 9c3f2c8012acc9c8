//! Live event channel client.
//!
//! Maintains a WebSocket connection to the backend's live channel,
//! normalizes the named events (`coin_inserted`, `machine_on`,
//! `machine_off`) it delivers, and reconnects with jittered backoff when
//! the connection drops. Runs only while the foreground context runs.

use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing;

use machinehub_core::config::realtime::RealtimeConfig;
use machinehub_core::events::{NormalizedEvent, normalize_with_hint};
use machinehub_core::types::EventKind;

use super::backoff::ReconnectPolicy;

/// One frame on the live channel. The server names the event at the
/// frame level and nests the payload.
#[derive(Debug, Deserialize)]
struct LiveFrame {
    /// Named event, e.g. `coin_inserted`.
    #[serde(alias = "type")]
    event: String,
    /// Event payload.
    #[serde(default, alias = "data")]
    payload: Value,
}

/// Live channel client.
#[derive(Debug)]
pub struct LiveClient {
    /// WebSocket URL of the live channel.
    url: String,
    /// Reconnect policy bounds.
    config: RealtimeConfig,
}

impl LiveClient {
    /// Build a client. When the configured URL is empty it is derived
    /// from the API base URL (`http` → `ws`, path `/ws`).
    pub fn new(config: &RealtimeConfig, api_base_url: &str) -> Self {
        let url = if config.url.is_empty() {
            derive_ws_url(api_base_url, "/ws")
        } else {
            config.url.clone()
        };
        Self {
            url,
            config: config.clone(),
        }
    }

    /// Channel URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Run the connect/read loop until cancelled.
    ///
    /// Normalized events are sent on `events_tx` in arrival order. Frames
    /// that fail to decode or normalize are logged and skipped; the loop
    /// itself never errors out.
    pub async fn run(
        self,
        events_tx: mpsc::Sender<NormalizedEvent>,
        shutdown: CancellationToken,
    ) {
        let mut policy =
            ReconnectPolicy::new(self.config.reconnect_initial_ms, self.config.reconnect_max_ms);

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let connect = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = connect_async(self.url.as_str()) => result,
            };

            match connect {
                Ok((stream, _)) => {
                    tracing::info!(url = %self.url, "Live channel connected");
                    policy.reset();
                    self.read_loop(stream, &events_tx, &shutdown).await;
                    if shutdown.is_cancelled() {
                        break;
                    }
                    tracing::warn!(url = %self.url, "Live channel disconnected");
                }
                Err(e) => {
                    tracing::warn!(url = %self.url, "Live channel connect failed: {e}");
                }
            }

            let delay = policy.next_delay();
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        tracing::debug!("Live channel loop ended");
    }

    async fn read_loop<S>(
        &self,
        stream: S,
        events_tx: &mpsc::Sender<NormalizedEvent>,
        shutdown: &CancellationToken,
    ) where
        S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + Sink<Message>
            + Unpin,
    {
        let (mut sink, mut source) = stream.split();

        loop {
            let message = tokio::select! {
                _ = shutdown.cancelled() => break,
                msg = source.next() => msg,
            };

            match message {
                Some(Ok(Message::Text(text))) => {
                    if let Some(event) = decode_frame(text.as_str()) {
                        if events_tx.send(event).await.is_err() {
                            // Receiver gone; the owning context shut down.
                            break;
                        }
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if sink.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("Live channel read error: {e}");
                    break;
                }
            }
        }
    }
}

/// Decode and normalize one text frame. Returns `None` for frames that
/// are not events or that the normalizer rejects.
fn decode_frame(text: &str) -> Option<NormalizedEvent> {
    let frame: LiveFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!("Undecodable live frame: {e}");
            return None;
        }
    };

    let hint = frame.event.parse::<EventKind>().ok();
    let normalized = normalize_with_hint(&frame.payload, hint);
    if normalized.is_none() {
        tracing::debug!(event = %frame.event, "Dropped live event without machine id");
    }
    normalized
}

/// Derive a WebSocket URL from an HTTP base URL.
pub(crate) fn derive_ws_url(api_base_url: &str, path: &str) -> String {
    let base = api_base_url.trim_end_matches('/');
    let swapped = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{swapped}{path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_ws_url() {
        assert_eq!(
            derive_ws_url("http://localhost:3000", "/ws"),
            "ws://localhost:3000/ws"
        );
        assert_eq!(
            derive_ws_url("https://hub.example.com/", "/push"),
            "wss://hub.example.com/push"
        );
    }

    #[test]
    fn test_decode_named_frame() {
        let event = decode_frame(
            r#"{"event":"coin_inserted","payload":{"machine_id":"5","data":{"cantidad":2}}}"#,
        )
        .unwrap();
        assert_eq!(event.kind, EventKind::CoinInserted);
        assert_eq!(event.amount, Some(2));
    }

    #[test]
    fn test_decode_rejects_missing_machine() {
        assert!(decode_frame(r#"{"event":"machine_on","payload":{}}"#).is_none());
        assert!(decode_frame("not json").is_none());
    }

    #[test]
    fn test_payload_type_wins_over_frame_name() {
        let event = decode_frame(
            r#"{"event":"machine_on","payload":{"type":"machine_off","machine_id":"7"}}"#,
        )
        .unwrap();
        assert_eq!(event.kind, EventKind::MachineOff);
    }
}
