//! Background feed of power-source change notifications.
//!
//! The feed only signals *that* the power source changed. Resolving the new
//! state and notifying subscribers happens on the daemon's event loop through
//! [`PowerMonitor::handle_power_source_change`](super::PowerMonitor::handle_power_source_change).

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use super::source::PowerSource;
use crate::utils::thread::spawn_named_thread;

/// Callback run on the feed thread when the power source changes.
pub type ChangeNotifier = Box<dyn Fn() + Send + 'static>;

/// A running polling thread. Dropping it stops the thread.
#[derive(Debug)]
pub struct PowerFeed {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PowerFeed {
    /// Starts polling `source` every `interval`.
    ///
    /// A differing reading is sampled again after `settle` and only reported
    /// when both samples agree, so a flapping adapter does not produce a burst
    /// of notifications.
    ///
    /// Returns `None` if the thread could not be spawned.
    pub fn start(
        source: Arc<dyn PowerSource>,
        interval: Duration,
        settle: Duration,
        notify: ChangeNotifier,
    ) -> Option<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = spawn_named_thread("power-feed", move || {
            let mut last = source.sample();

            loop {
                if stop_rx.recv_timeout(interval) != Err(RecvTimeoutError::Timeout) {
                    break;
                }

                let reading = source.sample();
                if reading == last {
                    continue;
                }

                if stop_rx.recv_timeout(settle) != Err(RecvTimeoutError::Timeout) {
                    break;
                }

                let confirmed = source.sample();
                if confirmed != reading {
                    tracing::trace!(%reading, %confirmed, "power reading did not settle");
                    continue;
                }

                tracing::debug!(from = %last, to = %confirmed, "power source changed");
                last = confirmed;
                notify();
            }

            tracing::debug!("power feed stopped");
        })?;

        Some(Self { stop: Some(stop_tx), handle: Some(handle) })
    }

    /// Stops the polling thread and waits for it to exit.
    pub fn stop(&mut self) {
        // Dropping the sender wakes the thread immediately.
        self.stop.take();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("power feed thread panicked");
        }
    }
}

impl Drop for PowerFeed {
    fn drop(&mut self) { self.stop(); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::power::source::SimulatedPowerSource;
    use crate::types::PowerState;

    #[test]
    fn reports_settled_changes() {
        let source = SimulatedPowerSource::new(PowerState::PluggedIn);
        let (tx, rx) = mpsc::channel();

        let _feed = PowerFeed::start(
            Arc::new(source.clone()),
            Duration::from_millis(10),
            Duration::from_millis(5),
            Box::new(move || {
                let _ = tx.send(());
            }),
        )
        .unwrap();

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        source.set(PowerState::OnBattery);
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn stop_joins_the_thread() {
        let source = SimulatedPowerSource::new(PowerState::PluggedIn);
        let mut feed = PowerFeed::start(
            Arc::new(source),
            Duration::from_secs(60),
            Duration::from_secs(1),
            Box::new(|| {}),
        )
        .unwrap();

        feed.stop();
        assert!(feed.handle.is_none());
        feed.stop();
    }
}
