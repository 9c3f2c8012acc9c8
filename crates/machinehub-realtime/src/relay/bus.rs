//! In-memory broadcast bus between the worker and foreground contexts.

use tokio::sync::broadcast;
use tracing;

use super::message::{RelayEnvelope, RelayMessage};

/// Relay bus carrying worker broadcasts to every open foreground
/// instance. Cheap to clone; all clones share the channel.
#[derive(Debug, Clone)]
pub struct RelayBus {
    sender: broadcast::Sender<RelayEnvelope>,
}

impl RelayBus {
    /// Create a bus with the given buffer size.
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size.max(1));
        Self { sender }
    }

    /// Broadcast a message. Messages sent while no foreground instance
    /// is subscribed are dropped, matching platform behavior for pages
    /// that are not open.
    pub fn publish(&self, message: RelayMessage) {
        let envelope = RelayEnvelope::new(message);
        match self.sender.send(envelope) {
            Ok(receivers) => {
                tracing::trace!(receivers, "Relay message broadcast");
            }
            Err(_) => {
                tracing::trace!("Relay message dropped: no foreground instances");
            }
        }
    }

    /// Subscribe a foreground instance.
    pub fn subscribe(&self) -> broadcast::Receiver<RelayEnvelope> {
        self.sender.subscribe()
    }
}

impl Default for RelayBus {
    fn default() -> Self {
        Self::new(64)
    }
}
