//! A typed multicast channel with snapshot-at-publish delivery.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Counter for generating unique subscription IDs across all channels.
static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one subscription on one channel. Returned by
/// [`NotifyChannel::subscribe`] and consumed by
/// [`NotifyChannel::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// One registered listener.
struct Subscriber<T> {
    id: SubscriptionId,
    callback: Arc<dyn Fn(&T) + Send + Sync>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
        }
    }
}

/// A multicast channel carrying payloads of type `T`.
///
/// Listeners are invoked in subscription order. A publish takes a snapshot
/// of the current subscriber list and then releases the lock, so a
/// listener that subscribes or unsubscribes from inside its callback
/// affects only future publishes, never the one in progress. Each listener
/// runs under `catch_unwind`: a panicking listener is logged and skipped,
/// and delivery continues with the next one.
///
/// Cloning is cheap and shares the subscriber list, so the publishing side
/// and the subscribing side can hold their own copies.
pub struct NotifyChannel<T> {
    subscribers: Arc<Mutex<Vec<Subscriber<T>>>>,
}

impl<T> Clone for NotifyChannel<T> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

impl<T> Default for NotifyChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NotifyChannel<T> {
    /// Creates a channel with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    // A poisoned lock only means some thread panicked while touching the
    // list; the list itself is still coherent, so recover it rather than
    // propagate the poison to every later subscriber.
    fn list(&self) -> std::sync::MutexGuard<'_, Vec<Subscriber<T>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a listener and returns its subscription ID.
    ///
    /// The listener is called for every subsequent publish, in the order
    /// subscriptions were made, until it is unsubscribed.
    pub fn subscribe(
        &self,
        callback: impl Fn(&T) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(
            NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        self.list().push(Subscriber {
            id,
            callback: Arc::new(callback),
        });
        id
    }

    /// Removes a listener. Returns `false` if the ID was already gone,
    /// which makes double-unsubscribe harmless.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut list = self.list();
        let before = list.len();
        list.retain(|s| s.id != id);
        list.len() != before
    }

    /// Delivers `payload` to every currently-subscribed listener.
    ///
    /// Fire-and-forget: runs on the caller's thread, returns when every
    /// listener in the snapshot has been invoked (or skipped after a
    /// panic).
    pub fn publish(&self, payload: &T) {
        let snapshot: Vec<Subscriber<T>> = self.list().clone();
        for subscriber in &snapshot {
            let callback = Arc::clone(&subscriber.callback);
            let result =
                panic::catch_unwind(AssertUnwindSafe(|| callback(payload)));
            if result.is_err() {
                tracing::warn!(
                    subscription = ?subscriber.id,
                    "listener panicked during publish, skipping it"
                );
            }
        }
    }

    /// Returns the number of current subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.list().len()
    }
}
