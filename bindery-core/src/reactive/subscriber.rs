//! Value subscribers for reactive nodes.
//!
//! A subscriber is a callback that observes every value a node is assigned,
//! whether the assignment came from caller code or from a bound element.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;

/// Unique identifier for a subscriber.
///
/// Returned by [`ReactiveNode::subscribe`](super::ReactiveNode::subscribe)
/// and used to remove the subscription again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A callback notified with each new node value.
#[derive(Clone)]
pub struct Subscriber {
    id: SubscriberId,
    notify: Arc<dyn Fn(&Value) + Send + Sync>,
}

impl Subscriber {
    /// Create a new subscriber with the given notification callback.
    pub fn new<F>(notify: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        Self {
            id: SubscriberId::new(),
            notify: Arc::new(notify),
        }
    }

    /// Get the subscriber's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Deliver a new value.
    pub fn notify(&self, value: &Value) {
        (self.notify)(value);
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    #[test]
    fn subscriber_ids_are_unique() {
        let id1 = SubscriberId::new();
        let id2 = SubscriberId::new();
        let id3 = SubscriberId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn subscriber_notify_passes_value() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let subscriber = Subscriber::new(move |value| {
            seen_clone.lock().push(value.clone());
        });

        subscriber.notify(&json!("a"));
        subscriber.notify(&json!(2));
        assert_eq!(*seen.lock(), vec![json!("a"), json!(2)]);
    }

    #[test]
    fn cloned_subscriber_keeps_id() {
        let subscriber = Subscriber::new(|_| {});
        assert_eq!(subscriber.clone().id(), subscriber.id());
    }
}
