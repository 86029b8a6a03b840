//! Power state observation.
//!
//! [`PowerMonitor`] keeps the last known [`PowerState`] and tells subscribers
//! when the machine switches between battery and mains power. Readings come
//! from a [`PowerSource`]; [`feed::PowerFeed`] polls it in the background and
//! only *signals* a change, the state itself is resolved on the caller's
//! context by [`PowerMonitor::handle_power_source_change`].

pub mod feed;
pub mod source;

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

pub use feed::{ChangeNotifier, PowerFeed};
pub use source::{BatteryPowerSource, PowerSource, SimulatedPowerSource};

use crate::constants::{POWER_POLL_INTERVAL, POWER_SETTLE_DELAY};
use crate::types::PowerState;
use crate::utils::{SubscriptionId, Subscribers};

/// Debounced, pollable view of the machine's power source.
pub struct PowerMonitor {
    source: Arc<dyn PowerSource>,
    current: PowerState,
    subscribers: Subscribers<PowerState>,
    feed: Option<PowerFeed>,
    active: bool,
}

impl std::fmt::Debug for PowerMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerMonitor")
            .field("current", &self.current)
            .field("active", &self.active)
            .field("monitoring", &self.feed.is_some())
            .finish_non_exhaustive()
    }
}

impl PowerMonitor {
    /// Creates a monitor over `source`. Nothing is sampled until
    /// [`force_update`](Self::force_update) or a feed notification.
    #[must_use]
    pub fn new(source: Arc<dyn PowerSource>) -> Self {
        Self {
            source,
            current: PowerState::Unknown,
            subscribers: Subscribers::new(),
            feed: None,
            active: true,
        }
    }

    /// Starts the background feed.
    ///
    /// `notify` runs on the feed thread; it should forward the signal to the
    /// owner's context, which then calls
    /// [`handle_power_source_change`](Self::handle_power_source_change).
    /// Calling `start` on a running or cleaned-up monitor does nothing.
    pub fn start(&mut self, notify: ChangeNotifier) {
        if !self.active || self.feed.is_some() {
            return;
        }

        self.feed = PowerFeed::start(
            Arc::clone(&self.source),
            POWER_POLL_INTERVAL,
            POWER_SETTLE_DELAY,
            notify,
        );

        if self.feed.is_none() {
            tracing::warn!("power feed unavailable, power state stays {}", self.current);
        }
    }

    /// Last known power state. `Unknown` until the first sample.
    #[must_use]
    pub const fn get_current_state(&self) -> PowerState { self.current }

    /// Registers the primary callback, replacing the previous one.
    ///
    /// The callback is not invoked by the registration itself.
    pub fn set_power_state_callback<F>(&self, callback: F) -> SubscriptionId
    where F: Fn(&PowerState) + Send + Sync + 'static {
        self.subscribers.replace_primary(callback)
    }

    /// Adds an independent subscriber.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where F: Fn(&PowerState) + Send + Sync + 'static {
        self.subscribers.subscribe(callback)
    }

    /// Adds a subscriber that receives changes over a channel.
    pub fn subscribe_channel(&self) -> (SubscriptionId, UnboundedReceiver<PowerState>) {
        self.subscribers.subscribe_channel()
    }

    /// Removes a subscriber.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool { self.subscribers.unsubscribe(id) }

    /// Samples the source now and notifies subscribers if the state changed.
    ///
    /// Returns the new state when subscribers were notified.
    pub fn force_update(&mut self) -> Option<PowerState> {
        if !self.active {
            return None;
        }

        let reading = self.source.sample();
        self.apply(reading)
    }

    /// Resolves the state after a feed notification.
    ///
    /// Same rule as [`force_update`](Self::force_update).
    pub fn handle_power_source_change(&mut self) -> Option<PowerState> {
        if !self.active {
            return None;
        }

        tracing::debug!("power source change notification");
        let reading = self.source.sample();
        self.apply(reading)
    }

    /// Stops the feed and drops every subscriber. Safe to call repeatedly.
    ///
    /// The cached state stays readable.
    pub fn cleanup(&mut self) {
        if let Some(mut feed) = self.feed.take() {
            feed.stop();
        }
        self.subscribers.clear();
        self.active = false;
    }

    /// Whether the background feed is running.
    #[must_use]
    pub const fn is_monitoring(&self) -> bool { self.feed.is_some() }

    fn apply(&mut self, reading: PowerState) -> Option<PowerState> {
        let previous = std::mem::replace(&mut self.current, reading);

        // An indeterminate reading is cached silently.
        if previous == reading || !reading.is_determinate() {
            return None;
        }

        tracing::info!(state = %reading, "power state changed");
        self.subscribers.emit(&reading);
        Some(reading)
    }
}

impl Drop for PowerMonitor {
    fn drop(&mut self) { self.cleanup(); }
}
