//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensor bus, MQTT publisher, NVS store, event sinks)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! and the [`Scheduler`](crate::scheduler::Scheduler) consume them via
//! generics, so the domain core never touches hardware directly.

use crate::registry::{Channel, HW_COUNT, HardwareId};

// ───────────────────────────────────────────────────────────────
// Driver port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port over the sensor bus.
///
/// Implementations must tolerate any `(hw, channel)` pair; a channel the
/// unit does not produce simply reads as `None`.
pub trait DriverPort {
    /// (Re-)initialize one unit.  Returns `false` when the probe or
    /// warm-up sequence fails; the unit stays registered either way.
    fn initialize(&mut self, hw: HardwareId) -> bool;

    /// Read one measurement channel.  `None` means the value could not
    /// be obtained this pass (bus error, CRC failure, unit not ready).
    fn read(&mut self, hw: HardwareId, channel: Channel) -> Option<f32>;
}

// ───────────────────────────────────────────────────────────────
// Publish port (driven adapter: domain → message bus)
// ───────────────────────────────────────────────────────────────

/// Write-side port for measurement publication.
///
/// `f32::NAN` is the explicit "no value this cycle" sentinel and MUST be
/// forwarded like any other reading — subscribers distinguish a silent
/// node from a node whose sensor failed.
pub trait PublishPort {
    fn publish(&mut self, hw: HardwareId, channel: Channel, value: f32);
}

// ───────────────────────────────────────────────────────────────
// Enable-state store (driven adapter: domain ↔ NVS)
// ───────────────────────────────────────────────────────────────

/// Persistent per-unit enabled flags.
///
/// Writes are total: every accepted enable/disable command persists the
/// whole map, never a single entry.  The ESP-IDF NVS API makes each entry
/// write atomic; the in-memory simulation achieves it trivially.
pub trait EnableStorePort {
    /// Load one unit's flag.  Absent key reads as `true` (enabled).
    fn load(&self, hw: HardwareId) -> bool;

    /// Persist the full enabled map, in registry order.
    fn save_all(&mut self, flags: &[(HardwareId, bool); HW_COUNT]) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, MQTT
/// status topic, test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`EnableStorePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Storage partition is full.
    Full,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
