//! services/api/src/adapters/notifier.rs
//!
//! Implements the `NotificationService` port. Each toast is logged and fanned
//! out to every connected event stream.

use medication_tracker_core::ports::{Notification, NotificationLevel, NotificationService};
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Toasts kept for subscribers that fall behind.
const CHANNEL_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationService for BroadcastNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => info!(
                title = %notification.title,
                "{}",
                notification.description
            ),
            NotificationLevel::Error => warn!(
                title = %notification.title,
                "{}",
                notification.description
            ),
        }
        // No subscribers is fine: the toast has been logged.
        let _ = self.sender.send(notification);
    }
}
