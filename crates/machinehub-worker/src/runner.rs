//! Worker run loop.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing;

use machinehub_realtime::PushSource;

use crate::notifier::PushNotifier;

/// Consume push deliveries until the source closes or shutdown is
/// signalled.
///
/// Deliveries are processed one at a time in arrival order; a fallback
/// fetch in flight delays later messages rather than reordering them.
pub async fn run_push_worker(
    mut source: impl PushSource,
    notifier: Arc<PushNotifier>,
    shutdown: CancellationToken,
) {
    loop {
        let message = tokio::select! {
            _ = shutdown.cancelled() => break,
            msg = source.next_message() => msg,
        };

        let Some(message) = message else {
            tracing::debug!("Push source closed");
            break;
        };

        let outcome = notifier.handle_push(message).await;
        tracing::trace!(?outcome, "Push delivery processed");
    }

    tracing::debug!("Push worker stopped");
}
