//! Push channel adapter for the background worker context.

mod source;

pub use source::{ChannelPushSource, PushMessage, PushSource, WebSocketPushSource};
