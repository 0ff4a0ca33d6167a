//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! A status-topic MQTT adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::IntervalChanged {
                quantity,
                key,
                interval_ms,
            } => {
                info!(
                    "CONFIG | {} interval: {}s (key '{}')",
                    quantity.name(),
                    interval_ms / 1000,
                    key
                );
            }
            AppEvent::EnableChanged { hw, enabled } => {
                info!(
                    "ENABLE | {} {}",
                    hw.id(),
                    if *enabled { "enabled" } else { "disabled" }
                );
            }
            // Reset requests are warnings: they usually mean an operator
            // saw something wrong with the readings.
            AppEvent::ResetRequested { target } => {
                warn!("RESET | command: {}", target);
            }
            AppEvent::ReinitResult { hw, ok } => {
                if *ok {
                    info!("RESET | {} reinitialized", hw.label());
                } else {
                    warn!("RESET | {} reinit failed", hw.label());
                }
            }
        }
    }
}
