//! Polling scheduler.
//!
//! One due-check per hardware unit per tick, against the live
//! [`SensorConfig`].  The scheduler owns nothing but the per-unit
//! last-read timestamps; configuration belongs to the service and the
//! hardware sits behind ports, so the whole engine runs unmodified under
//! the host test suite.
//!
//! ```text
//!  tick(now) ──▶ for each unit:
//!                  disabled? ──────────▶ skip (timestamp untouched)
//!                  now-last < interval ─▶ skip
//!                  else ────────────────▶ last = now
//!                                         read ch₀..chₙ ──▶ publish
//!                                         (failed read ──▶ publish NaN)
//! ```
//!
//! A unit that stays disabled keeps its old timestamp, so the first tick
//! after re-enable is immediately due.  Timestamps start at zero: the
//! first poll of a fresh boot lands one full interval after start.

use log::warn;

use crate::app::ports::{DriverPort, PublishPort};
use crate::config::SensorConfig;
use crate::registry::{HW_COUNT, HardwareId};

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Per-unit polling state.  Construct once at boot; never persisted.
pub struct Scheduler {
    /// Monotonic timestamp of the last completed poll, per unit.
    last_read_ms: [u64; HW_COUNT],
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            last_read_ms: [0; HW_COUNT],
        }
    }

    /// Run one scheduling pass.
    ///
    /// `now_ms` must come from a monotonic clock.  For every enabled unit
    /// whose interval has elapsed, every channel of that unit is read and
    /// published exactly once; a failed channel read publishes `f32::NAN`
    /// instead.  The timestamp advances on the due transition, before any
    /// reads, so a slow or failing bus cannot compress the next interval.
    pub fn tick(
        &mut self,
        now_ms: u64,
        config: &SensorConfig,
        driver: &mut impl DriverPort,
        publisher: &mut impl PublishPort,
    ) {
        for hw in HardwareId::ALL {
            if !config.is_enabled(hw) {
                continue;
            }
            let idx = hw.index();
            if now_ms.saturating_sub(self.last_read_ms[idx]) < config.interval_ms(hw) {
                continue;
            }
            self.last_read_ms[idx] = now_ms;

            for &channel in hw.channels() {
                match driver.read(hw, channel) {
                    Some(value) => publisher.publish(hw, channel, value),
                    None => {
                        warn!("{} {}: read failed, publishing NaN", hw.id(), channel.name());
                        publisher.publish(hw, channel, f32::NAN);
                    }
                }
            }
        }
    }

    /// Timestamp of the unit's last completed poll (0 = never polled).
    pub fn last_read_ms(&self, hw: HardwareId) -> u64 {
        self.last_read_ms[hw.index()]
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
