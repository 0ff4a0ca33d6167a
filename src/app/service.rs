//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the live [`SensorConfig`] and interprets every
//! inbound command.  All I/O flows through port traits injected at call
//! sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  MQTT bridge ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                  │       AppService        │
//!   DriverPort ◀───│  route · parse · apply  │──▶ EnableStorePort
//!                  └────────────────────────┘
//! ```
//!
//! Command handling is deliberately forgiving: nothing an external peer
//! sends can take the node down.  Malformed input is logged and dropped,
//! unknown targets are ignored, and a failed flash write never blocks the
//! in-memory change.

use log::{error, warn};
use serde_json::Value;

use crate::alias::{self, ALIASES, Resolution};
use crate::config::SensorConfig;
use crate::registry::HardwareId;

use super::commands::{self, EnableRequest, ResetRequest, SensorCommand};
use super::events::AppEvent;
use super::ports::{DriverPort, EnableStorePort, EventSink};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all command handling.
pub struct AppService {
    config: SensorConfig,
}

impl AppService {
    /// Construct with compiled-in defaults (60 s, all enabled).
    pub fn new() -> Self {
        Self {
            config: SensorConfig::default(),
        }
    }

    /// Construct at boot: defaults overlaid with the persisted enabled
    /// flags.  Intervals always restart at the default.
    pub fn boot(store: &impl EnableStorePort) -> Self {
        let mut config = SensorConfig::default();
        for hw in HardwareId::ALL {
            config.set_enabled(hw, store.load(hw));
        }
        Self { config }
    }

    /// Read-only view of the live configuration (the scheduler's input).
    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// One initialization pass over every unit.  Run once at startup;
    /// failures are logged and tolerated (the unit will publish the
    /// missing-value sentinel until a reset command revives it).
    pub fn init_hardware(&self, driver: &mut impl DriverPort) {
        for hw in HardwareId::ALL {
            if driver.initialize(hw) {
                log::info!("{} ready", hw.label());
            } else {
                warn!("{} failed to initialize", hw.label());
            }
        }
    }

    // ── Message dispatch ──────────────────────────────────────

    /// Route one inbound message by topic suffix and dispatch it.
    /// Topics that are not sensor commands are ignored silently.
    pub fn handle_message(
        &mut self,
        topic: &str,
        payload: &[u8],
        driver: &mut impl DriverPort,
        store: &mut impl EnableStorePort,
        sink: &mut impl EventSink,
    ) {
        match commands::route(topic) {
            Some(SensorCommand::Config) => self.handle_config_update(payload, sink),
            Some(SensorCommand::Enable) => self.handle_enable(payload, store, sink),
            Some(SensorCommand::Reset) => self.handle_reset(payload, driver, sink),
            None => {}
        }
    }

    // ── Config update ─────────────────────────────────────────

    /// Apply an interval-configuration payload.
    ///
    /// Each quantity's key cascade resolves independently; an accepted
    /// value is stored in milliseconds and announced through the sink.
    /// Rejected values (below the 5 s floor, wrong type) are dropped
    /// silently.
    pub fn handle_config_update(&mut self, payload: &[u8], sink: &mut impl EventSink) {
        let parsed: Value = match serde_json::from_slice(payload) {
            Ok(v) => v,
            Err(e) => {
                error!("sensors/config: malformed payload: {}", e);
                return;
            }
        };
        // A config message without a `sensors` object is addressed to some
        // other subsystem sharing the topic; not an error.
        let Some(sensors) = parsed.get("sensors").and_then(Value::as_object) else {
            return;
        };

        for entry in &ALIASES {
            match alias::resolve(sensors, entry.keys) {
                Resolution::Accepted { key, secs } => {
                    let interval_ms = secs * 1000;
                    self.config.set_interval_ms(entry.target, interval_ms);
                    sink.emit(&AppEvent::IntervalChanged {
                        quantity: entry.quantity,
                        key,
                        interval_ms,
                    });
                }
                Resolution::Rejected { .. } | Resolution::Absent => {}
            }
        }
    }

    // ── Enable / disable ──────────────────────────────────────

    /// Apply an enable/disable payload and persist the full flag map.
    pub fn handle_enable(
        &mut self,
        payload: &[u8],
        store: &mut impl EnableStorePort,
        sink: &mut impl EventSink,
    ) {
        let req: EnableRequest = match serde_json::from_slice(payload) {
            Ok(r) => r,
            Err(e) => {
                error!("sensors/enable: malformed payload: {}", e);
                return;
            }
        };
        let Some(hw) = HardwareId::from_id(req.hardware.as_str()) else {
            warn!("sensors/enable: unknown hardware id '{}'", req.hardware);
            return;
        };

        self.config.set_enabled(hw, req.enabled);
        if let Err(e) = store.save_all(&self.config.enabled_snapshot()) {
            // The in-memory change stands; the next boot falls back to the
            // last state that did reach flash.
            warn!("enable state for {} not persisted: {}", hw.id(), e);
        }
        sink.emit(&AppEvent::EnableChanged {
            hw,
            enabled: req.enabled,
        });
    }

    // ── Reset ─────────────────────────────────────────────────

    /// Re-initialize every unit the requested target matches.
    ///
    /// The audit event fires before matching, so requests that select
    /// nothing still leave a trace.  Match outcomes are reported per unit.
    pub fn handle_reset(
        &mut self,
        payload: &[u8],
        driver: &mut impl DriverPort,
        sink: &mut impl EventSink,
    ) {
        let Ok(req) = serde_json::from_slice::<ResetRequest>(payload) else {
            return;
        };
        sink.emit(&AppEvent::ResetRequested {
            target: req.sensor.clone(),
        });

        for hw in HardwareId::ALL {
            if alias::reset_matches(hw, req.sensor.as_str()) {
                let ok = driver.initialize(hw);
                sink.emit(&AppEvent::ReinitResult { hw, ok });
            }
        }
    }
}

impl Default for AppService {
    fn default() -> Self {
        Self::new()
    }
}
