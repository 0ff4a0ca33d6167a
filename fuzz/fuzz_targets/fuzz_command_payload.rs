//! Fuzz target: `AppService::handle_message`
//!
//! Drives arbitrary payload bytes into every sensor-command topic and
//! asserts that the handlers never panic and never push a polling
//! interval below the 5 s floor.
//!
//! cargo fuzz run fuzz_command_payload

#![no_main]

use airnode::app::events::AppEvent;
use airnode::app::ports::{DriverPort, EnableStorePort, EventSink, StorageError};
use airnode::app::service::AppService;
use airnode::config::MIN_INTERVAL_SECS;
use airnode::registry::{Channel, HW_COUNT, HardwareId};
use libfuzzer_sys::fuzz_target;

struct NullDriver;
impl DriverPort for NullDriver {
    fn initialize(&mut self, _hw: HardwareId) -> bool {
        true
    }
    fn read(&mut self, _hw: HardwareId, _channel: Channel) -> Option<f32> {
        None
    }
}

struct NullStore;
impl EnableStorePort for NullStore {
    fn load(&self, _hw: HardwareId) -> bool {
        true
    }
    fn save_all(&mut self, _flags: &[(HardwareId, bool); HW_COUNT]) -> Result<(), StorageError> {
        Ok(())
    }
}

struct NullSink;
impl EventSink for NullSink {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let mut app = AppService::new();
    let mut driver = NullDriver;
    let mut store = NullStore;
    let mut sink = NullSink;

    for topic in [
        "airnode/module-esp32-1/sensors/config",
        "airnode/module-esp32-1/sensors/enable",
        "airnode/module-esp32-1/sensors/reset",
    ] {
        app.handle_message(topic, data, &mut driver, &mut store, &mut sink);
    }

    for hw in HardwareId::ALL {
        assert!(
            app.config().interval_ms(hw) >= MIN_INTERVAL_SECS * 1000,
            "interval fell below the floor"
        );
    }
});
