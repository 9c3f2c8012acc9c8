//! Toast and sound presentation.

use async_trait::async_trait;
use tracing;

use machinehub_core::types::EventKind;
use machinehub_store::Toast;

/// Sound cues played on live events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Coin insert chime (`coin.mp3`).
    Coin,
    /// Power-on cue (`on.mp3`).
    MachineOn,
    /// Power-off cue (`off.mp3`).
    MachineOff,
}

impl SoundCue {
    /// Cue for an event kind. Unknown kinds play nothing.
    pub fn for_kind(kind: EventKind) -> Option<Self> {
        match kind {
            EventKind::CoinInserted => Some(Self::Coin),
            EventKind::MachineOn => Some(Self::MachineOn),
            EventKind::MachineOff => Some(Self::MachineOff),
            EventKind::Other => None,
        }
    }
}

/// Presentation sink for the foreground dashboard.
#[async_trait]
pub trait UiSink: Send + Sync {
    /// Show a transient toast.
    async fn toast(&self, toast: Toast);
    /// Play a sound cue.
    async fn play(&self, cue: SoundCue);
}

/// Sink that logs presentation calls. Used when the agent runs headless.
#[derive(Debug, Default)]
pub struct LogUiSink;

#[async_trait]
impl UiSink for LogUiSink {
    async fn toast(&self, toast: Toast) {
        tracing::info!(title = %toast.title, body = %toast.body, "Toast");
    }

    async fn play(&self, cue: SoundCue) {
        tracing::debug!(?cue, "Sound cue");
    }
}
