//! Push message sources.
//!
//! The platform delivers push messages to the background worker
//! independently of any open dashboard. The worker consumes them through
//! the [`PushSource`] trait: the production source is a WebSocket
//! subscription to the push gateway, tests and in-process wiring use a
//! channel-backed source.

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing;

use machinehub_core::config::push::PushConfig;

use crate::live::ReconnectPolicy;

/// One push delivery. The body is opaque here; empty and unparseable
/// bodies are normal inputs for the worker, never errors.
#[derive(Debug, Clone, Default)]
pub struct PushMessage {
    /// Raw message body, possibly empty.
    pub body: Vec<u8>,
}

impl PushMessage {
    /// Message with a body.
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self { body: body.into() }
    }

    /// Message without a payload.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// A source of push deliveries.
#[async_trait]
pub trait PushSource: Send {
    /// Wait for the next delivery. `None` means the source is closed and
    /// the worker should stop.
    async fn next_message(&mut self) -> Option<PushMessage>;
}

/// Channel-backed source, used for in-process wiring and tests.
#[derive(Debug)]
pub struct ChannelPushSource {
    receiver: mpsc::Receiver<PushMessage>,
}

impl ChannelPushSource {
    /// Create a source and the sender side that feeds it.
    pub fn new(buffer: usize) -> (mpsc::Sender<PushMessage>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self { receiver: rx })
    }
}

#[async_trait]
impl PushSource for ChannelPushSource {
    async fn next_message(&mut self) -> Option<PushMessage> {
        self.receiver.recv().await
    }
}

/// WebSocket subscription to the push gateway.
///
/// Reconnects with the same jittered backoff as the live channel. Each
/// text or binary frame is one push delivery.
pub struct WebSocketPushSource {
    url: String,
    policy: ReconnectPolicy,
    shutdown: CancellationToken,
    messages: mpsc::Receiver<PushMessage>,
    feeder: Option<mpsc::Sender<PushMessage>>,
}

impl WebSocketPushSource {
    /// Build a source from configuration. When the configured gateway URL
    /// is empty it is derived from the API base URL.
    pub fn new(config: &PushConfig, api_base_url: &str, shutdown: CancellationToken) -> Self {
        let url = if config.gateway_url.is_empty() {
            crate::live::client::derive_ws_url(api_base_url, "/push")
        } else {
            config.gateway_url.clone()
        };
        let (tx, rx) = mpsc::channel(64);
        Self {
            url,
            policy: ReconnectPolicy::new(500, 30_000),
            shutdown,
            messages: rx,
            feeder: Some(tx),
        }
    }

    /// Gateway URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Spawn the connect/read loop. Call once before consuming.
    pub fn start(&mut self) {
        let Some(feeder) = self.feeder.take() else {
            return;
        };
        let url = self.url.clone();
        let mut policy = self.policy.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            loop {
                if shutdown.is_cancelled() {
                    break;
                }

                let connect = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    result = connect_async(url.as_str()) => result,
                };

                match connect {
                    Ok((stream, _)) => {
                        tracing::info!(url = %url, "Push gateway connected");
                        policy.reset();
                        let (_write, mut source) = stream.split::<Message>();
                        loop {
                            let message = tokio::select! {
                                _ = shutdown.cancelled() => return,
                                msg = source.next() => msg,
                            };
                            let push = match message {
                                Some(Ok(Message::Text(text))) => {
                                    PushMessage::new(text.as_str().as_bytes().to_vec())
                                }
                                Some(Ok(Message::Binary(data))) => {
                                    PushMessage::new(data.to_vec())
                                }
                                Some(Ok(Message::Close(_))) | None => break,
                                Some(Ok(_)) => continue,
                                Some(Err(e)) => {
                                    tracing::debug!("Push gateway read error: {e}");
                                    break;
                                }
                            };
                            if feeder.send(push).await.is_err() {
                                return;
                            }
                        }
                        tracing::warn!(url = %url, "Push gateway disconnected");
                    }
                    Err(e) => {
                        tracing::warn!(url = %url, "Push gateway connect failed: {e}");
                    }
                }

                let delay = policy.next_delay();
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        });
    }
}

#[async_trait]
impl PushSource for WebSocketPushSource {
    async fn next_message(&mut self) -> Option<PushMessage> {
        self.messages.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_source_delivers_in_order() {
        let (tx, mut source) = ChannelPushSource::new(8);
        tx.send(PushMessage::new(b"one".to_vec())).await.unwrap();
        tx.send(PushMessage::empty()).await.unwrap();
        drop(tx);

        assert_eq!(source.next_message().await.unwrap().body, b"one");
        assert!(source.next_message().await.unwrap().body.is_empty());
        assert!(source.next_message().await.is_none());
    }

    #[test]
    fn test_derive_push_url() {
        let config = PushConfig::default();
        let source = WebSocketPushSource::new(
            &config,
            "https://hub.example.com",
            CancellationToken::new(),
        );
        assert_eq!(source.url(), "wss://hub.example.com/push");
    }
}
