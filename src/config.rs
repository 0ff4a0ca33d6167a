//! Runtime sensor configuration.
//!
//! One polling interval and one enabled flag per hardware unit, indexed by
//! [`HardwareId`]. Rebuilt from defaults at every boot; the enabled flags
//! are then overlaid from NVS so a disable survives power loss. Intervals
//! are runtime-only and reset to 60 s on restart.

use crate::registry::{HW_COUNT, HardwareId};

/// Default polling interval applied to every unit at boot.
pub const DEFAULT_INTERVAL_MS: u64 = 60_000;

/// Minimum accepted interval on the remote-config surface, in seconds.
/// Requests below this are dropped without touching the stored value.
pub const MIN_INTERVAL_SECS: u64 = 5;

/// Live per-unit polling configuration.
///
/// Owned by the main loop and threaded by `&mut` into the command handlers
/// and the scheduler; nothing else holds a reference to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorConfig {
    /// Polling interval per unit, milliseconds.
    intervals_ms: [u64; HW_COUNT],
    /// Whether the unit is polled at all.
    enabled: [bool; HW_COUNT],
}

impl SensorConfig {
    pub fn interval_ms(&self, hw: HardwareId) -> u64 {
        self.intervals_ms[hw.index()]
    }

    pub fn set_interval_ms(&mut self, hw: HardwareId, interval_ms: u64) {
        self.intervals_ms[hw.index()] = interval_ms;
    }

    pub fn is_enabled(&self, hw: HardwareId) -> bool {
        self.enabled[hw.index()]
    }

    pub fn set_enabled(&mut self, hw: HardwareId, enabled: bool) {
        self.enabled[hw.index()] = enabled;
    }

    /// Snapshot of all enabled flags, in registry order. This is the unit
    /// of persistence: the store always writes the whole map.
    pub fn enabled_snapshot(&self) -> [(HardwareId, bool); HW_COUNT] {
        let mut out = [(HardwareId::Mhz14a, true); HW_COUNT];
        for hw in HardwareId::ALL {
            out[hw.index()] = (hw, self.enabled[hw.index()]);
        }
        out
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            intervals_ms: [DEFAULT_INTERVAL_MS; HW_COUNT],
            enabled: [true; HW_COUNT],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_one_minute_all_enabled() {
        let c = SensorConfig::default();
        for hw in HardwareId::ALL {
            assert_eq!(c.interval_ms(hw), 60_000);
            assert!(c.is_enabled(hw));
        }
    }

    #[test]
    fn interval_updates_are_per_unit() {
        let mut c = SensorConfig::default();
        c.set_interval_ms(HardwareId::Dht22, 10_000);
        assert_eq!(c.interval_ms(HardwareId::Dht22), 10_000);
        for hw in HardwareId::ALL {
            if hw != HardwareId::Dht22 {
                assert_eq!(c.interval_ms(hw), 60_000);
            }
        }
    }

    #[test]
    fn enable_flag_updates_are_per_unit() {
        let mut c = SensorConfig::default();
        c.set_enabled(HardwareId::Sps30, false);
        assert!(!c.is_enabled(HardwareId::Sps30));
        assert!(c.is_enabled(HardwareId::Sgp30));
    }

    #[test]
    fn snapshot_covers_all_units_in_order() {
        let mut c = SensorConfig::default();
        c.set_enabled(HardwareId::Sc16co, false);
        let snap = c.enabled_snapshot();
        assert_eq!(snap.len(), HW_COUNT);
        for (i, (hw, en)) in snap.iter().enumerate() {
            assert_eq!(hw.index(), i);
            assert_eq!(*en, hw != &HardwareId::Sc16co);
        }
    }

    #[test]
    fn floor_is_below_default() {
        assert!(MIN_INTERVAL_SECS * 1000 < DEFAULT_INTERVAL_MS);
    }
}
