//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them — log to serial, mirror to a status
//! topic, record in tests.

use crate::alias::Quantity;
use crate::registry::HardwareId;

/// Longest reset target we keep verbatim for the audit trail; anything
/// longer is truncated when captured.
pub const RESET_TARGET_CAP: usize = 24;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A polling interval was changed by remote configuration.
    /// `key` is the payload key that carried the accepted value.
    IntervalChanged {
        quantity: Quantity,
        key: &'static str,
        interval_ms: u64,
    },

    /// A unit was enabled or disabled by remote command.
    EnableChanged { hw: HardwareId, enabled: bool },

    /// A reset command arrived.  Emitted before any target matching, so
    /// the audit trail records requests that match nothing.
    ResetRequested {
        target: heapless::String<RESET_TARGET_CAP>,
    },

    /// Outcome of one unit's re-initialization after a reset command.
    ReinitResult { hw: HardwareId, ok: bool },
}
