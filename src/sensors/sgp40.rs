//! Sensirion SGP40 VOC sensor (I²C, auxiliary bus, addr 0x59).
//!
//! Publishes the raw VOC signal (SRAW ticks).  Index post-processing
//! (Sensirion's gas-index algorithm) happens downstream of the broker,
//! so the node stays stateless across power cycles.
//!
//! The `measure_raw` command carries humidity/temperature compensation
//! words; without a co-located reference we send the datasheet defaults
//! (50 % RH, 25 °C).

use core::time::Duration;

use embedded_hal::i2c::I2c;

use crate::sensors::sensirion_crc8;

pub const SGP40_ADDR: u8 = 0x59;

const CMD_SELF_TEST: [u8; 2] = [0x28, 0x0E];
const SELF_TEST_DELAY_MS: u64 = 320;
/// Self-test response word for "all tests passed".
const SELF_TEST_OK: u8 = 0xD4;

const MEASURE_DELAY_MS: u64 = 30;

/// Default compensation: RH 50 % (0x8000) and T 25 °C (0x6666).
const DEFAULT_RH_TICKS: u16 = 0x8000;
const DEFAULT_T_TICKS: u16 = 0x6666;

pub struct Sgp40;

impl Sgp40 {
    pub fn new() -> Self {
        Self
    }

    /// Run the on-chip self-test; passing doubles as the presence probe.
    pub fn init<I: I2c>(&mut self, i2c: &mut I) -> bool {
        if i2c.write(SGP40_ADDR, &CMD_SELF_TEST).is_err() {
            return false;
        }
        std::thread::sleep(Duration::from_millis(SELF_TEST_DELAY_MS));
        let mut buf = [0u8; 3];
        if i2c.read(SGP40_ADDR, &mut buf).is_err() {
            return false;
        }
        sensirion_crc8(&buf[0..2]) == buf[2] && buf[0] == SELF_TEST_OK
    }

    /// One raw VOC measurement (SRAW ticks).
    pub fn read<I: I2c>(&mut self, i2c: &mut I) -> Option<f32> {
        i2c.write(SGP40_ADDR, &build_measure_cmd()).ok()?;
        std::thread::sleep(Duration::from_millis(MEASURE_DELAY_MS));
        let mut buf = [0u8; 3];
        i2c.read(SGP40_ADDR, &mut buf).ok()?;
        parse_raw(&buf)
    }
}

impl Default for Sgp40 {
    fn default() -> Self {
        Self::new()
    }
}

/// `measure_raw` with default compensation words, CRC per 16-bit argument.
pub fn build_measure_cmd() -> [u8; 8] {
    let rh = DEFAULT_RH_TICKS.to_be_bytes();
    let t = DEFAULT_T_TICKS.to_be_bytes();
    [
        0x26,
        0x0F,
        rh[0],
        rh[1],
        sensirion_crc8(&rh),
        t[0],
        t[1],
        sensirion_crc8(&t),
    ]
}

pub fn parse_raw(buf: &[u8; 3]) -> Option<f32> {
    if sensirion_crc8(&buf[0..2]) != buf[2] {
        return None;
    }
    Some(u16::from_be_bytes([buf[0], buf[1]]) as f32)
}
