//! Best-effort tenant notifications.
//!
//! Writes are detached from the request: the caller never waits on them and a
//! failed insert is logged, not returned.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::models::notification::NewNotification;
use crate::store::Store;

/// Spawns the notification insert and returns immediately.
///
/// The handle is only for tests; request paths drop it.
pub fn dispatch(store: Arc<dyn Store>, notification: NewNotification) -> JoinHandle<()> {
    tokio::spawn(async move {
        let kind = notification.kind.as_str();
        match store.create_notification(&notification).await {
            Ok(()) => debug!(
                "Notification {kind} recorded for customer {}",
                notification.customer_id
            ),
            Err(e) => warn!(
                "Failed to record {kind} notification for customer {}: {e}",
                notification.customer_id
            ),
        }
    })
}
