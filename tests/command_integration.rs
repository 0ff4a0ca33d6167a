//! Integration tests: MQTT topic → AppService → ports.
//!
//! Every test drives `handle_message` with raw topic strings and JSON
//! payload bytes, exactly as the bridge delivers them, and observes the
//! node through the port traits only.

use std::collections::HashMap;

use airnode::app::events::AppEvent;
use airnode::app::ports::{DriverPort, EnableStorePort, EventSink, StorageError};
use airnode::app::service::AppService;
use airnode::config::SensorConfig;
use airnode::registry::{Channel, HW_COUNT, HardwareId};

const TOPIC_CONFIG: &str = "airnode/module-esp32-1/sensors/config";
const TOPIC_ENABLE: &str = "airnode/module-esp32-1/sensors/enable";
const TOPIC_RESET: &str = "airnode/module-esp32-1/sensors/reset";

// ── Mock implementations ──────────────────────────────────────

/// Driver that records initialization calls and fails on listed units.
struct MockDriver {
    init_calls: Vec<HardwareId>,
    failing: Vec<HardwareId>,
}
impl MockDriver {
    fn new() -> Self {
        Self {
            init_calls: Vec::new(),
            failing: Vec::new(),
        }
    }
}
impl DriverPort for MockDriver {
    fn initialize(&mut self, hw: HardwareId) -> bool {
        self.init_calls.push(hw);
        !self.failing.contains(&hw)
    }
    fn read(&mut self, _hw: HardwareId, _channel: Channel) -> Option<f32> {
        None
    }
}

/// In-memory enable store counting save attempts.
struct MemStore {
    flags: HashMap<String, bool>,
    save_count: usize,
    fail_saves: bool,
}
impl MemStore {
    fn new() -> Self {
        Self {
            flags: HashMap::new(),
            save_count: 0,
            fail_saves: false,
        }
    }
}
impl EnableStorePort for MemStore {
    fn load(&self, hw: HardwareId) -> bool {
        self.flags.get(hw.id()).copied().unwrap_or(true)
    }
    fn save_all(&mut self, flags: &[(HardwareId, bool); HW_COUNT]) -> Result<(), StorageError> {
        self.save_count += 1;
        if self.fail_saves {
            return Err(StorageError::IoError);
        }
        for (hw, enabled) in flags {
            self.flags.insert(hw.id().to_string(), *enabled);
        }
        Ok(())
    }
}

struct Recorder {
    events: Vec<AppEvent>,
}
impl Recorder {
    fn new() -> Self {
        Self { events: Vec::new() }
    }
}
impl EventSink for Recorder {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

fn make_app() -> (AppService, MockDriver, MemStore, Recorder) {
    (
        AppService::new(),
        MockDriver::new(),
        MemStore::new(),
        Recorder::new(),
    )
}

// ── Config topic ──────────────────────────────────────────────

#[test]
fn config_topic_updates_interval_and_reports_key() {
    let (mut app, mut hw, mut store, mut sink) = make_app();
    app.handle_message(
        TOPIC_CONFIG,
        br#"{"sensors": {"co2": {"interval": 30}}}"#,
        &mut hw,
        &mut store,
        &mut sink,
    );
    assert_eq!(app.config().interval_ms(HardwareId::Mhz14a), 30_000);
    assert_eq!(
        sink.events,
        vec![AppEvent::IntervalChanged {
            quantity: airnode::alias::Quantity::Co2,
            key: "co2",
            interval_ms: 30_000,
        }]
    );
}

#[test]
fn qualified_key_beats_legacy_in_the_same_message() {
    let (mut app, mut hw, mut store, mut sink) = make_app();
    app.handle_message(
        TOPIC_CONFIG,
        br#"{"sensors": {
            "temperature": {"interval": 15},
            "dht22:temperature": {"interval": 120}
        }}"#,
        &mut hw,
        &mut store,
        &mut sink,
    );
    assert_eq!(
        app.config().interval_ms(HardwareId::Dht22),
        120_000,
        "the hardware-qualified key must win over the legacy key"
    );
    assert_eq!(sink.events.len(), 1);
    assert!(matches!(
        sink.events[0],
        AppEvent::IntervalChanged {
            key: "dht22:temperature",
            ..
        }
    ));
}

#[test]
fn one_message_updates_several_quantities() {
    let (mut app, mut hw, mut store, mut sink) = make_app();
    app.handle_message(
        TOPIC_CONFIG,
        br#"{"sensors": {
            "co2": {"interval": 30},
            "voc": {"interval": 10},
            "pm": {"interval": 90}
        }}"#,
        &mut hw,
        &mut store,
        &mut sink,
    );
    assert_eq!(app.config().interval_ms(HardwareId::Mhz14a), 30_000);
    assert_eq!(app.config().interval_ms(HardwareId::Sgp40), 10_000);
    assert_eq!(app.config().interval_ms(HardwareId::Sps30), 90_000);
    // Unmentioned units keep the default.
    assert_eq!(app.config().interval_ms(HardwareId::Bmp280), 60_000);
    assert_eq!(sink.events.len(), 3);
}

#[test]
fn below_floor_interval_is_dropped_silently() {
    let (mut app, mut hw, mut store, mut sink) = make_app();
    app.handle_message(
        TOPIC_CONFIG,
        br#"{"sensors": {"co2": {"interval": 4}}}"#,
        &mut hw,
        &mut store,
        &mut sink,
    );
    assert_eq!(
        app.config(),
        &SensorConfig::default(),
        "a below-floor interval must not touch the stored value"
    );
    assert!(sink.events.is_empty());
}

#[test]
fn malformed_json_leaves_config_untouched() {
    let (mut app, mut hw, mut store, mut sink) = make_app();
    app.handle_message(TOPIC_CONFIG, b"not json at all", &mut hw, &mut store, &mut sink);
    assert_eq!(app.config(), &SensorConfig::default());
    assert!(sink.events.is_empty());
}

#[test]
fn config_without_sensors_object_is_not_an_error() {
    let (mut app, mut hw, mut store, mut sink) = make_app();
    // Addressed to some other subsystem sharing the topic.
    app.handle_message(
        TOPIC_CONFIG,
        br#"{"display": {"brightness": 3}}"#,
        &mut hw,
        &mut store,
        &mut sink,
    );
    // Wrong shape for `sensors` is equally uninteresting.
    app.handle_message(TOPIC_CONFIG, br#"{"sensors": 42}"#, &mut hw, &mut store, &mut sink);
    assert_eq!(app.config(), &SensorConfig::default());
    assert!(sink.events.is_empty());
}

// ── Enable topic ──────────────────────────────────────────────

#[test]
fn enable_disables_unit_and_persists_the_whole_map() {
    let (mut app, mut hw, mut store, mut sink) = make_app();
    app.handle_message(
        TOPIC_ENABLE,
        br#"{"hardware": "sps30", "enabled": false}"#,
        &mut hw,
        &mut store,
        &mut sink,
    );
    assert!(!app.config().is_enabled(HardwareId::Sps30));
    assert_eq!(store.save_count, 1);
    assert_eq!(
        store.flags.len(),
        HW_COUNT,
        "persistence writes the full map, not one entry"
    );
    assert_eq!(store.flags.get("sps30"), Some(&false));
    assert_eq!(store.flags.get("dht22"), Some(&true));
    assert_eq!(
        sink.events,
        vec![AppEvent::EnableChanged {
            hw: HardwareId::Sps30,
            enabled: false,
        }]
    );
}

#[test]
fn enable_unknown_hardware_is_rejected() {
    let (mut app, mut hw, mut store, mut sink) = make_app();
    app.handle_message(
        TOPIC_ENABLE,
        br#"{"hardware": "bme680", "enabled": false}"#,
        &mut hw,
        &mut store,
        &mut sink,
    );
    assert_eq!(app.config(), &SensorConfig::default());
    assert_eq!(store.save_count, 0, "unknown units must not reach the store");
    assert!(sink.events.is_empty());
}

#[test]
fn failed_save_keeps_the_in_memory_change() {
    let (mut app, mut hw, mut store, mut sink) = make_app();
    store.fail_saves = true;
    app.handle_message(
        TOPIC_ENABLE,
        br#"{"hardware": "sgp30", "enabled": false}"#,
        &mut hw,
        &mut store,
        &mut sink,
    );
    assert!(
        !app.config().is_enabled(HardwareId::Sgp30),
        "a flash failure must not roll back the running state"
    );
    assert_eq!(
        sink.events,
        vec![AppEvent::EnableChanged {
            hw: HardwareId::Sgp30,
            enabled: false,
        }]
    );
}

// ── Reset topic ───────────────────────────────────────────────

#[test]
fn reset_all_reinitializes_every_unit_in_order() {
    let (mut app, mut hw, mut store, mut sink) = make_app();
    app.handle_message(TOPIC_RESET, br#"{"sensor": "all"}"#, &mut hw, &mut store, &mut sink);

    assert_eq!(hw.init_calls, HardwareId::ALL.to_vec());
    assert_eq!(sink.events.len(), 1 + HW_COUNT);
    assert!(matches!(
        &sink.events[0],
        AppEvent::ResetRequested { target } if target.as_str() == "all"
    ));
    for (event, hw) in sink.events[1..].iter().zip(HardwareId::ALL) {
        assert_eq!(event, &AppEvent::ReinitResult { hw, ok: true });
    }
}

#[test]
fn reset_alias_selects_a_single_unit() {
    let (mut app, mut hw, mut store, mut sink) = make_app();
    app.handle_message(TOPIC_RESET, br#"{"sensor": "temp"}"#, &mut hw, &mut store, &mut sink);
    assert_eq!(
        hw.init_calls,
        vec![HardwareId::Dht22],
        "'temp' is the DHT22's legacy name, not the SHT40's"
    );
    assert_eq!(sink.events.len(), 2);
}

#[test]
fn reset_reports_a_failed_reinit() {
    let (mut app, mut hw, mut store, mut sink) = make_app();
    hw.failing.push(HardwareId::Sgp40);
    app.handle_message(TOPIC_RESET, br#"{"sensor": "sgp40"}"#, &mut hw, &mut store, &mut sink);
    assert_eq!(
        sink.events[1],
        AppEvent::ReinitResult {
            hw: HardwareId::Sgp40,
            ok: false,
        }
    );
}

#[test]
fn reset_unknown_target_only_audits() {
    let (mut app, mut hw, mut store, mut sink) = make_app();
    app.handle_message(TOPIC_RESET, br#"{"sensor": "bme680"}"#, &mut hw, &mut store, &mut sink);
    assert!(hw.init_calls.is_empty());
    assert_eq!(sink.events.len(), 1, "the request itself still leaves a trace");
    assert!(matches!(sink.events[0], AppEvent::ResetRequested { .. }));
}

// ── Topic routing ─────────────────────────────────────────────

#[test]
fn foreign_topics_are_ignored_entirely() {
    let (mut app, mut hw, mut store, mut sink) = make_app();
    for topic in [
        "airnode/module-esp32-1/ota/begin",
        "airnode/module-esp32-1/sensors/config/extra",
        "airnode/module-esp32-1/dht22/temperature",
        "",
    ] {
        app.handle_message(
            topic,
            br#"{"hardware": "sps30", "enabled": false}"#,
            &mut hw,
            &mut store,
            &mut sink,
        );
    }
    assert_eq!(app.config(), &SensorConfig::default());
    assert!(hw.init_calls.is_empty());
    assert_eq!(store.save_count, 0);
    assert!(sink.events.is_empty());
}

#[test]
fn any_site_prefix_reaches_the_handlers() {
    let (mut app, mut hw, mut store, mut sink) = make_app();
    app.handle_message(
        "hub/site-b/airnode/node-7/sensors/enable",
        br#"{"hardware": "sc16co", "enabled": false}"#,
        &mut hw,
        &mut store,
        &mut sink,
    );
    assert!(!app.config().is_enabled(HardwareId::Sc16co));
}
