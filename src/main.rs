//! AirNode Firmware — Main Entry Point
//!
//! Hexagonal architecture around a polling scheduler core.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   MqttAdapter     NvsEnableStore              │
//! │  (DriverPort)      (PublishPort)   (EnableStorePort)           │
//! │  LogEventSink      MonotonicClock  WiFi station                │
//! │  (EventSink)       (time base)     (bring-up only)             │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  topic routing · alias cascades · enable map           │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (per-unit due check → read channels → publish)      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Module declarations ───────────────────────────────────────
pub mod config;
mod alias;
mod pins;
mod scheduler;

pub mod app;
pub mod registry;
mod adapters;
mod sensors;

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{info, warn};

use esp_idf_hal::gpio::Gpio0;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::UartDriver;
use esp_idf_hal::units::Hertz;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use adapters::hardware::HardwareAdapter;
use adapters::log_sink::LogEventSink;
use adapters::mqtt::{self, MqttAdapter};
use adapters::nvs::NvsEnableStore;
use adapters::time::MonotonicClock;
use adapters::wifi::{self, WifiSettings};
use app::service::AppService;
use scheduler::Scheduler;
use sensors::SensorBus;

/// Main-loop cadence.  The command drain and the scheduler due checks run
/// on this period; actual polling is paced by the per-unit intervals.
const TICK_PERIOD_MS: u64 = 250;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("╔══════════════════════════════════════╗");
    info!("║  AirNode v{}                         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;

    // ── 2. Enabled flags from NVS (or defaults) ───────────────
    let mut store = match NvsEnableStore::new() {
        Ok(s) => s,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            // On next reboot, NVS should self-heal.
            NvsEnableStore::default()
        }
    };

    // ── 3. Network bring-up ───────────────────────────────────
    let nvs_partition = EspDefaultNvsPartition::take()?;
    let settings = WifiSettings::from_build_env()
        .map_err(|e| anyhow::anyhow!("WiFi credentials rejected: {}", e))?;
    let _wifi = wifi::connect_station(peripherals.modem, sysloop, nvs_partition, &settings)?;

    let mut publisher = MqttAdapter::connect()?;

    // ── 4. Sensor buses ───────────────────────────────────────
    // The HAL wants typed pin singletons, so the GPIO numbers from `pins`
    // reappear here literally; keep the two in sync when rewiring.
    let i2c_main = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &I2cConfig::new().baudrate(Hertz(100_000)),
    )?;
    let i2c_aux = I2cDriver::new(
        peripherals.i2c1,
        peripherals.pins.gpio32,
        peripherals.pins.gpio33,
        &I2cConfig::new().baudrate(Hertz(100_000)),
    )?;
    let uart_co2 = UartDriver::new(
        peripherals.uart2,
        peripherals.pins.gpio26,
        peripherals.pins.gpio25,
        Option::<Gpio0>::None,
        Option::<Gpio0>::None,
        &esp_idf_hal::uart::config::Config::default().baudrate(Hertz(9_600)),
    )?;
    let uart_pm = UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio27,
        peripherals.pins.gpio13,
        Option::<Gpio0>::None,
        Option::<Gpio0>::None,
        &esp_idf_hal::uart::config::Config::default().baudrate(Hertz(115_200)),
    )?;

    // ── 5. Construct adapters ─────────────────────────────────
    let mut hw = HardwareAdapter::new(SensorBus::new(i2c_main, i2c_aux, uart_co2, uart_pm));
    let mut sink = LogEventSink::new();
    let clock = MonotonicClock::new();

    // ── 6. Construct app service ──────────────────────────────
    let mut app = AppService::boot(&store);
    app.init_hardware(&mut hw);
    let mut sched = Scheduler::new();

    info!("Boot finished in {} s", clock.uptime_secs());
    info!("System ready. Entering poll loop.");

    // ── 7. Poll loop ──────────────────────────────────────────
    loop {
        // Commands first, so an enable/interval change is visible to the
        // due checks of the same tick.
        while let Some(msg) = mqtt::try_recv_inbound() {
            app.handle_message(&msg.topic, &msg.payload, &mut hw, &mut store, &mut sink);
        }

        sched.tick(clock.now_ms(), app.config(), &mut hw, &mut publisher);

        std::thread::sleep(core::time::Duration::from_millis(TICK_PERIOD_MS));
    }
}
