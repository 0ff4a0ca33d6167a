//! Hardware adapter — bridges the sensor buses to the domain port traits.
//!
//! Owns the [`SensorBus`] and exposes it through [`DriverPort`].  This is
//! the only module in the system that touches actual hardware.  On
//! non-espidf targets the underlying bus serves cfg-gated simulation
//! values.

use crate::app::ports::DriverPort;
use crate::registry::{Channel, HardwareId};
use crate::sensors::SensorBus;

/// Concrete adapter that puts the whole sensor complement behind
/// [`DriverPort`].
pub struct HardwareAdapter {
    bus: SensorBus,
}

impl HardwareAdapter {
    pub fn new(bus: SensorBus) -> Self {
        Self { bus }
    }
}

// ── DriverPort implementation ─────────────────────────────────

impl DriverPort for HardwareAdapter {
    fn initialize(&mut self, hw: HardwareId) -> bool {
        self.bus.initialize(hw)
    }

    fn read(&mut self, hw: HardwareId, channel: Channel) -> Option<f32> {
        self.bus.read(hw, channel)
    }
}
