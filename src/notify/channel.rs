//! Fan-out of cache events to any number of subscribers.

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

use super::CacheEvent;

/// Unbounded pub/sub channel.
///
/// Publishing never blocks on a slow subscriber: every subscriber has its
/// own unbounded queue. Subscribers that dropped their receiver are pruned
/// on the next publish.
///
/// # Example
/// ```
/// use residency::{BufferId, CacheEvent, NotificationChannel, RegistryChange};
///
/// let channel = NotificationChannel::new();
/// let rx = channel.subscribe();
///
/// let event = CacheEvent::Registry {
///     id: BufferId::new(0),
///     change: RegistryChange::Registered,
///     size: 16,
/// };
/// channel.publish(event);
/// assert_eq!(rx.try_recv().unwrap(), event);
/// ```
#[derive(Debug, Default)]
pub struct NotificationChannel {
    subscribers: Mutex<Vec<Sender<CacheEvent>>>,
}

impl NotificationChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A receiver for every event published from now on.
    pub fn subscribe(&self) -> Receiver<CacheEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Enqueue `event` for every live subscriber.
    pub fn publish(&self, event: CacheEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event).is_ok());
    }

    /// Number of subscribers seen alive at the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
