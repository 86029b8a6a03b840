//! Power source sampling.

use std::sync::Arc;

use parking_lot::Mutex;
use starship_battery::{Manager, State};

use crate::types::PowerState;

/// Something that can report the machine's power source on demand.
pub trait PowerSource: Send + Sync {
    /// Samples the power source now.
    ///
    /// Implementations never fail: an unreadable source reports `Unknown`.
    fn sample(&self) -> PowerState;
}

/// Reads the power source from the machine's batteries.
#[derive(Debug, Default, Clone, Copy)]
pub struct BatteryPowerSource;

impl PowerSource for BatteryPowerSource {
    fn sample(&self) -> PowerState {
        let manager = match Manager::new() {
            Ok(manager) => manager,
            Err(err) => {
                tracing::debug!(error = %err, "battery manager unavailable");
                return PowerState::Unknown;
            }
        };

        let batteries = match manager.batteries() {
            Ok(batteries) => batteries,
            Err(err) => {
                tracing::debug!(error = %err, "failed to list batteries");
                return PowerState::Unknown;
            }
        };

        let mut states = Vec::new();
        for battery in batteries {
            match battery {
                Ok(battery) => states.push(battery.state()),
                Err(err) => {
                    tracing::debug!(error = %err, "failed to read battery");
                    return PowerState::Unknown;
                }
            }
        }

        classify(&states)
    }
}

/// Maps battery states to a power source.
///
/// A machine without batteries runs from mains power. Any battery that is
/// draining means the machine is on battery.
#[must_use]
pub fn classify(states: &[State]) -> PowerState {
    if states.is_empty() {
        return PowerState::PluggedIn;
    }

    if states.iter().any(|state| matches!(state, State::Discharging | State::Empty)) {
        PowerState::OnBattery
    } else if states.iter().any(|state| matches!(state, State::Charging | State::Full)) {
        PowerState::PluggedIn
    } else {
        PowerState::Unknown
    }
}

/// Power source whose reading is set by hand.
///
/// Clones share the same reading, so a test can keep one clone and hand the
/// other to a [`PowerMonitor`](super::PowerMonitor).
#[derive(Debug, Clone, Default)]
pub struct SimulatedPowerSource {
    state: Arc<Mutex<PowerState>>,
}

impl SimulatedPowerSource {
    /// Creates a source reporting `initial`.
    #[must_use]
    pub fn new(initial: PowerState) -> Self { Self { state: Arc::new(Mutex::new(initial)) } }

    /// Changes the reported state.
    pub fn set(&self, state: PowerState) { *self.state.lock() = state; }
}

impl PowerSource for SimulatedPowerSource {
    fn sample(&self) -> PowerState { *self.state.lock() }
}
