//! Inbound command routing and payload shapes.
//!
//! Commands arrive as MQTT messages.  The broker-side topic layout is not
//! ours to dictate (hubs prefix topics differently across sites), so
//! routing keys off the topic **suffix** only.  Unrecognized suffixes are
//! dropped without logging — the node shares its subscription tree with
//! other services and their traffic is not an anomaly.

use serde::Deserialize;

use super::events::RESET_TARGET_CAP;

/// Topic suffix carrying interval configuration.
pub const CONFIG_SUFFIX: &str = "/sensors/config";
/// Topic suffix carrying reset requests.
pub const RESET_SUFFIX: &str = "/sensors/reset";
/// Topic suffix carrying enable/disable requests.
pub const ENABLE_SUFFIX: &str = "/sensors/enable";

/// The command classes the node reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorCommand {
    /// Update polling intervals (`CONFIG_SUFFIX`).
    Config,
    /// Re-initialize hardware units (`RESET_SUFFIX`).
    Reset,
    /// Enable or disable a unit (`ENABLE_SUFFIX`).
    Enable,
}

/// Map a topic to its command class by suffix.
pub fn route(topic: &str) -> Option<SensorCommand> {
    if topic.ends_with(CONFIG_SUFFIX) {
        Some(SensorCommand::Config)
    } else if topic.ends_with(RESET_SUFFIX) {
        Some(SensorCommand::Reset)
    } else if topic.ends_with(ENABLE_SUFFIX) {
        Some(SensorCommand::Enable)
    } else {
        None
    }
}

// ───────────────────────────────────────────────────────────────
// Payload shapes
// ───────────────────────────────────────────────────────────────

/// `{"hardware": "<id>", "enabled": <bool>}`
///
/// Bounded string: an id longer than the cap fails deserialization, which
/// the handler treats like any other malformed payload.
#[derive(Debug, Deserialize)]
pub struct EnableRequest {
    pub hardware: heapless::String<RESET_TARGET_CAP>,
    pub enabled: bool,
}

/// `{"sensor": "<target>"}`
#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub sensor: heapless::String<RESET_TARGET_CAP>,
}
