//! Sensirion SGP30 air-quality sensor (I²C, main bus, addr 0x58).
//!
//! Reports eCO₂ (ppm) and TVOC (ppb) from one `measure_iaq` command.
//! For the first ~15 s after `init_air_quality` the part returns its
//! fixed warm-up values (400 ppm / 0 ppb); those are published as-is.

use core::time::Duration;

use embedded_hal::i2c::I2c;

use crate::sensors::sensirion_crc8;

pub const SGP30_ADDR: u8 = 0x58;

const CMD_INIT_AIR_QUALITY: [u8; 2] = [0x20, 0x03];
const CMD_MEASURE_IAQ: [u8; 2] = [0x20, 0x08];

const INIT_DELAY_MS: u64 = 10;
const MEASURE_DELAY_MS: u64 = 12;

pub struct Sgp30;

impl Sgp30 {
    pub fn new() -> Self {
        Self
    }

    /// Start the on-chip IAQ algorithm.  Must be re-sent after any reset,
    /// which is why the reset path re-runs `initialize` for this unit.
    pub fn init<I: I2c>(&mut self, i2c: &mut I) -> bool {
        if i2c.write(SGP30_ADDR, &CMD_INIT_AIR_QUALITY).is_err() {
            return false;
        }
        std::thread::sleep(Duration::from_millis(INIT_DELAY_MS));
        true
    }

    /// One IAQ measurement: returns `(eco2_ppm, tvoc_ppb)`.
    pub fn read<I: I2c>(&mut self, i2c: &mut I) -> Option<(f32, f32)> {
        i2c.write(SGP30_ADDR, &CMD_MEASURE_IAQ).ok()?;
        std::thread::sleep(Duration::from_millis(MEASURE_DELAY_MS));
        let mut buf = [0u8; 6];
        i2c.read(SGP30_ADDR, &mut buf).ok()?;
        parse_iaq(&buf)
    }
}

impl Default for Sgp30 {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode `[eco2_msb eco2_lsb crc tvoc_msb tvoc_lsb crc]`.
pub fn parse_iaq(buf: &[u8; 6]) -> Option<(f32, f32)> {
    if sensirion_crc8(&buf[0..2]) != buf[2] || sensirion_crc8(&buf[3..5]) != buf[5] {
        return None;
    }
    let eco2 = u16::from_be_bytes([buf[0], buf[1]]);
    let tvoc = u16::from_be_bytes([buf[3], buf[4]]);
    Some((eco2 as f32, tvoc as f32))
}
