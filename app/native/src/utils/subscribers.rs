//! Typed subscription registry.
//!
//! Every observable component (power monitor, audio controller, wallpaper
//! engine) publishes its changes through a [`Subscribers`] registry so that the
//! daemon, the IPC layer and tests can all observe the same value without
//! overwriting each other's registration.
//!
//! The registry also keeps one optional *primary* slot. Registering a primary
//! callback replaces the previous primary callback, which preserves the
//! "single callback" API used by external bridges.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use uuid::Uuid;

/// Identifies a registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self { Self(Uuid::now_v7()) }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.0.fmt(f) }
}

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A list of callbacks interested in values of type `T`.
pub struct Subscribers<T> {
    entries: Mutex<Vec<(SubscriptionId, Callback<T>)>>,
    primary: Mutex<Option<SubscriptionId>>,
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            primary: Mutex::new(None),
        }
    }
}

impl<T> std::fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers").field("count", &self.len()).finish()
    }
}

impl<T> Subscribers<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Registers a callback and returns its id.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where F: Fn(&T) + Send + Sync + 'static {
        let id = SubscriptionId::new();
        self.entries.lock().push((id, Arc::new(callback)));
        id
    }

    /// Replaces the primary callback with `callback`.
    ///
    /// Other subscribers are untouched.
    pub fn replace_primary<F>(&self, callback: F) -> SubscriptionId
    where F: Fn(&T) + Send + Sync + 'static {
        let id = self.subscribe(callback);
        let previous = self.primary.lock().replace(id);
        if let Some(previous) = previous {
            self.unsubscribe(previous);
        }
        id
    }

    /// Removes a subscriber. Returns `false` if the id was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        let removed = entries.len() != before;
        drop(entries);

        let mut primary = self.primary.lock();
        if *primary == Some(id) {
            *primary = None;
        }

        removed
    }

    /// Removes every subscriber, including the primary one.
    pub fn clear(&self) {
        self.entries.lock().clear();
        *self.primary.lock() = None;
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.lock().len() }

    /// Whether no subscriber is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.lock().is_empty() }

    /// Invokes every subscriber with `value`.
    ///
    /// The registry lock is released before callbacks run, so a callback may
    /// subscribe or unsubscribe without deadlocking.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Callback<T>> =
            self.entries.lock().iter().map(|(_, callback)| Arc::clone(callback)).collect();

        for callback in snapshot {
            callback(value);
        }
    }
}

impl<T: Clone + Send + 'static> Subscribers<T> {
    /// Registers a channel publish point.
    ///
    /// Every emitted value is cloned into the returned receiver. Values sent
    /// after the receiver is dropped are discarded.
    pub fn subscribe_channel(&self) -> (SubscriptionId, UnboundedReceiver<T>) {
        let (tx, rx) = unbounded_channel();
        let id = self.subscribe(move |value: &T| {
            let _ = tx.send(value.clone());
        });
        (id, rx)
    }
}
