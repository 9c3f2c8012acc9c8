//! Platform notification sink.

use async_trait::async_trait;
use tracing;

use machinehub_core::result::AppResult;

use crate::render::RenderedNotification;

/// Hands rendered notifications to the platform.
///
/// The worker never cares how the notification is displayed; tests use a
/// recording sink to count invocations.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Display a notification.
    async fn show(&self, notification: RenderedNotification) -> AppResult<()>;
}

/// Sink that writes notifications to the log. Used when the agent runs
/// headless without a platform notification service.
#[derive(Debug, Default)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn show(&self, notification: RenderedNotification) -> AppResult<()> {
        tracing::info!(
            title = %notification.title,
            body = %notification.body,
            tag = %notification.tag,
            require_interaction = notification.require_interaction,
            "Notification"
        );
        Ok(())
    }
}
