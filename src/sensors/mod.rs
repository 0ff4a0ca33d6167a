//! Sensor subsystem — per-part drivers and the aggregating [`SensorBus`].
//!
//! Bus topology (see `pins` for the GPIO map):
//!
//! ```text
//!   unit     transport                    exchange
//!   ------   --------------------------   ----------------------------
//!   mhz14a   UART2 9600                   Winsen 9-byte Q&A
//!   dht22    GPIO 4 single-wire           40-bit timed frame
//!   sgp40    I²C aux @ 0x59               Sensirion cmd + CRC words
//!   sgp30    I²C main @ 0x58              Sensirion cmd + CRC words
//!   sps30    UART1 115200                 SHDLC framing
//!   bmp280   I²C main @ 0x76              register burst + trimming math
//!   sht40    I²C main @ 0x44              Sensirion cmd + CRC words
//!   sc16co   GPIO 14/12 software UART     Winsen 9-byte Q&A
//! ```
//!
//! ## Dual-target design
//!
//! On ESP-IDF the bus owns the real I²C/UART drivers and dispatches each
//! `(unit, channel)` read to the matching part driver.  On host/test
//! targets the bus serves values injected through `sim_set_channel`,
//! while the drivers' frame builders and parsers stay target-free and
//! are exercised directly with a scripted I²C bus.

pub mod bmp280;
pub mod dht22;
pub mod mhz14a;
pub mod sc16co;
pub mod sgp30;
pub mod sgp40;
pub mod sht40;
pub mod sps30;

use crate::registry::{Channel, HardwareId};

// ── Shared wire helpers ───────────────────────────────────────

/// Sensirion CRC-8 (poly 0x31, init 0xFF), computed per 16-bit word.
/// Shared by the SHT40, SGP30 and SGP40.
pub fn sensirion_crc8(bytes: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for &b in bytes {
        crc ^= b;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Winsen frame checksum: two's complement of the byte sum over
/// positions 1..8.  Shared by the MH-Z14A and SC16.
pub fn winsen_checksum(frame: &[u8; 9]) -> u8 {
    let sum = frame[1..8].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    (!sum).wrapping_add(1)
}

/// Discard stale RX bytes so a response parse starts frame-aligned.
#[cfg(target_os = "espidf")]
pub(crate) fn uart_drain(uart: &esp_idf_hal::uart::UartDriver<'_>) {
    let mut scratch = [0u8; 32];
    while matches!(uart.read(&mut scratch, 0), Ok(n) if n > 0) {}
}

/// Busy-wait until `pin` reads `level`; returns the elapsed µs.
///
/// SAFETY: caller holds the invariants for `gpio_get_level` (configured
/// input pin, main task only).
#[cfg(target_os = "espidf")]
pub(crate) unsafe fn wait_for_level(pin: i32, level: i32, timeout_us: i64) -> Option<i64> {
    use esp_idf_svc::sys::{esp_timer_get_time, gpio_get_level};
    let start = unsafe { esp_timer_get_time() };
    loop {
        if unsafe { gpio_get_level(pin) } == level {
            return Some(unsafe { esp_timer_get_time() } - start);
        }
        if unsafe { esp_timer_get_time() } - start > timeout_us {
            return None;
        }
    }
}

// ── SensorBus — ESP-IDF ───────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct SensorBus {
    i2c_main: esp_idf_hal::i2c::I2cDriver<'static>,
    i2c_aux: esp_idf_hal::i2c::I2cDriver<'static>,
    uart_co2: esp_idf_hal::uart::UartDriver<'static>,
    uart_pm: esp_idf_hal::uart::UartDriver<'static>,
    mhz14a: mhz14a::Mhz14a,
    dht22: dht22::Dht22,
    sgp40: sgp40::Sgp40,
    sgp30: sgp30::Sgp30,
    sps30: sps30::Sps30,
    bmp280: bmp280::Bmp280,
    sht40: sht40::Sht40,
    sc16co: sc16co::Sc16Co,
}

#[cfg(target_os = "espidf")]
impl SensorBus {
    /// Pass in pre-built bus drivers (built in `main` where peripheral
    /// ownership is established).
    pub fn new(
        i2c_main: esp_idf_hal::i2c::I2cDriver<'static>,
        i2c_aux: esp_idf_hal::i2c::I2cDriver<'static>,
        uart_co2: esp_idf_hal::uart::UartDriver<'static>,
        uart_pm: esp_idf_hal::uart::UartDriver<'static>,
    ) -> Self {
        Self {
            i2c_main,
            i2c_aux,
            uart_co2,
            uart_pm,
            mhz14a: mhz14a::Mhz14a::new(),
            dht22: dht22::Dht22::new(),
            sgp40: sgp40::Sgp40::new(),
            sgp30: sgp30::Sgp30::new(),
            sps30: sps30::Sps30::new(),
            bmp280: bmp280::Bmp280::new(),
            sht40: sht40::Sht40::new(),
            sc16co: sc16co::Sc16Co::new(),
        }
    }

    /// Probe/arm one unit.  Also the re-initialization entry point for
    /// reset commands, so every driver tolerates repeated calls.
    pub fn initialize(&mut self, hw: HardwareId) -> bool {
        match hw {
            HardwareId::Mhz14a => self.mhz14a.init(&self.uart_co2),
            HardwareId::Dht22 => self.dht22.init(),
            HardwareId::Sgp40 => self.sgp40.init(&mut self.i2c_aux),
            HardwareId::Sgp30 => self.sgp30.init(&mut self.i2c_main),
            HardwareId::Sps30 => self.sps30.init(&self.uart_pm),
            HardwareId::Bmp280 => self.bmp280.init(&mut self.i2c_main),
            HardwareId::Sht40 => self.sht40.init(&mut self.i2c_main),
            HardwareId::Sc16co => self.sc16co.init(),
        }
    }

    /// One channel read.  `None` means the value could not be obtained
    /// this poll; the caller decides how to report that.
    pub fn read(&mut self, hw: HardwareId, channel: Channel) -> Option<f32> {
        match (hw, channel) {
            (HardwareId::Mhz14a, Channel::Co2) => self.mhz14a.read_co2(&self.uart_co2),
            (HardwareId::Dht22, _) => self.dht22.read_channel(channel),
            (HardwareId::Sgp40, Channel::Voc) => self.sgp40.read(&mut self.i2c_aux),
            (HardwareId::Sgp30, Channel::Eco2) => {
                self.sgp30.read(&mut self.i2c_main).map(|(eco2, _)| eco2)
            }
            (HardwareId::Sgp30, Channel::Tvoc) => {
                self.sgp30.read(&mut self.i2c_main).map(|(_, tvoc)| tvoc)
            }
            (HardwareId::Sps30, _) => self.sps30.read_channel(&self.uart_pm, channel),
            (HardwareId::Bmp280, Channel::Pressure) => {
                self.bmp280.read_pressure(&mut self.i2c_main)
            }
            (HardwareId::Bmp280, Channel::Temperature) => {
                self.bmp280.read_temperature(&mut self.i2c_main)
            }
            (HardwareId::Sht40, Channel::Temperature) => {
                self.sht40.read(&mut self.i2c_main).map(|r| r.temperature_c)
            }
            (HardwareId::Sht40, Channel::Humidity) => {
                self.sht40.read(&mut self.i2c_main).map(|r| r.humidity_pct)
            }
            (HardwareId::Sc16co, Channel::Co) => self.sc16co.read_co(),
            _ => None,
        }
    }
}

// ── SensorBus — host simulation ───────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub struct SensorBus;

#[cfg(not(target_os = "espidf"))]
impl SensorBus {
    pub fn new() -> Self {
        log::info!("SensorBus: simulation backend");
        Self
    }

    pub fn initialize(&mut self, hw: HardwareId) -> bool {
        sim::unit_ok(hw)
    }

    pub fn read(&mut self, hw: HardwareId, channel: Channel) -> Option<f32> {
        sim::channel_value(hw, channel)
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for SensorBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
pub use sim::{sim_set_channel, sim_set_unit_ok};

/// Injection store for host builds.  Channels start absent (reads fail)
/// and units start healthy (initialization succeeds).
#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use crate::registry::{Channel, HardwareId, HW_COUNT};

    /// Widest unit (sps30) has four channels.
    const SLOTS_PER_UNIT: usize = 4;
    const SLOTS: usize = HW_COUNT * SLOTS_PER_UNIT;

    static VALUES: [AtomicU32; SLOTS] = [const { AtomicU32::new(0) }; SLOTS];
    static PRESENT: [AtomicBool; SLOTS] = [const { AtomicBool::new(false) }; SLOTS];
    static UNIT_OK: [AtomicBool; HW_COUNT] = [const { AtomicBool::new(true) }; HW_COUNT];

    fn slot(hw: HardwareId, channel: Channel) -> Option<usize> {
        let pos = hw.channels().iter().position(|&c| c == channel)?;
        Some(hw.index() * SLOTS_PER_UNIT + pos)
    }

    /// Inject a channel value; `None` makes reads of that channel fail.
    pub fn sim_set_channel(hw: HardwareId, channel: Channel, value: Option<f32>) {
        let Some(idx) = slot(hw, channel) else {
            return;
        };
        match value {
            Some(v) => {
                VALUES[idx].store(v.to_bits(), Ordering::Relaxed);
                PRESENT[idx].store(true, Ordering::Relaxed);
            }
            None => PRESENT[idx].store(false, Ordering::Relaxed),
        }
    }

    /// Control whether `initialize` reports the unit as ready.
    pub fn sim_set_unit_ok(hw: HardwareId, ok: bool) {
        UNIT_OK[hw.index()].store(ok, Ordering::Relaxed);
    }

    pub(super) fn channel_value(hw: HardwareId, channel: Channel) -> Option<f32> {
        let idx = slot(hw, channel)?;
        if !PRESENT[idx].load(Ordering::Relaxed) {
            return None;
        }
        Some(f32::from_bits(VALUES[idx].load(Ordering::Relaxed)))
    }

    pub(super) fn unit_ok(hw: HardwareId) -> bool {
        UNIT_OK[hw.index()].load(Ordering::Relaxed)
    }
}

// ── Test support ──────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensirion_crc8_matches_datasheet_vector() {
        // Every Sensirion datasheet quotes CRC(0xBEEF) = 0x92.
        assert_eq!(sensirion_crc8(&[0xBE, 0xEF]), 0x92);
    }

    #[test]
    fn winsen_checksum_matches_datasheet_vector() {
        assert_eq!(
            winsen_checksum(&[0xFF, 0x01, 0x86, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]),
            0x79
        );
    }

    #[test]
    fn sim_bus_serves_injected_values() {
        let mut bus = SensorBus::new();
        assert_eq!(bus.read(HardwareId::Mhz14a, Channel::Co2), None);

        sim_set_channel(HardwareId::Mhz14a, Channel::Co2, Some(412.0));
        assert_eq!(bus.read(HardwareId::Mhz14a, Channel::Co2), Some(412.0));

        sim_set_channel(HardwareId::Mhz14a, Channel::Co2, None);
        assert_eq!(bus.read(HardwareId::Mhz14a, Channel::Co2), None);
    }

    #[test]
    fn sim_bus_rejects_foreign_channel() {
        sim_set_channel(HardwareId::Mhz14a, Channel::Humidity, Some(55.0));
        assert_eq!(
            SensorBus::new().read(HardwareId::Mhz14a, Channel::Humidity),
            None
        );
    }

    #[test]
    fn sim_bus_initialize_follows_unit_health() {
        let mut bus = SensorBus::new();
        assert!(bus.initialize(HardwareId::Sgp40));
        sim_set_unit_ok(HardwareId::Sgp40, false);
        assert!(!bus.initialize(HardwareId::Sgp40));
        sim_set_unit_ok(HardwareId::Sgp40, true);
    }
}
