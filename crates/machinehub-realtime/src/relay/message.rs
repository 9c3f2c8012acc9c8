//! Relay message shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use machinehub_core::events::NormalizedEvent;

/// Messages the worker broadcasts to open foreground instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum RelayMessage {
    /// A coin event was rendered; foreground plays the coin cue.
    CoinNotification(NormalizedEvent),
    /// A fleet event was rendered; foreground updates in-memory state
    /// when it is not already covered by the live channel.
    EventNotification(NormalizedEvent),
}

impl RelayMessage {
    /// The event carried by this message.
    pub fn event(&self) -> &NormalizedEvent {
        match self {
            Self::CoinNotification(event) | Self::EventNotification(event) => event,
        }
    }
}

/// Envelope wrapping relay messages with delivery metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayEnvelope {
    /// Unique message id.
    pub id: Uuid,
    /// The message payload.
    pub message: RelayMessage,
    /// When the message was broadcast.
    pub timestamp: DateTime<Utc>,
}

impl RelayEnvelope {
    /// Wrap a message.
    pub fn new(message: RelayMessage) -> Self {
        Self {
            id: Uuid::new_v4(),
            message,
            timestamp: Utc::now(),
        }
    }
}
