//! Process-wide change notification.
//!
//! A payload-free signal dispatched after any successful local mutation.
//! Delivery is fire-and-forget and best-effort: consumers that care
//! re-fetch on receipt, and a notification with no listeners is not an
//! error.

use tokio::sync::broadcast;

/// Room for a burst of mutations before slow subscribers start lagging.
const CHANNEL_CAPACITY: usize = 16;

#[derive(Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<()>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe to change signals. Only mutations after this call are
    /// observed.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Announce that the local collection changed.
    pub fn notify(&self) {
        // An Err here only means nobody is listening right now.
        let _ = self.tx.send(());
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_notification() {
        let notifier = ChangeNotifier::new();
        let mut rx = notifier.subscribe();
        notifier.notify();
        rx.recv().await.expect("signal should arrive");
    }

    #[test]
    fn test_notify_without_subscribers_is_fine() {
        let notifier = ChangeNotifier::new();
        notifier.notify();
    }

    #[tokio::test]
    async fn test_clones_share_the_channel() {
        let notifier = ChangeNotifier::new();
        let clone = notifier.clone();
        let mut rx = notifier.subscribe();
        clone.notify();
        rx.recv().await.expect("signal from clone should arrive");
    }
}
