//! Sensirion SHT40 temperature/humidity sensor (I²C, main bus, addr 0x44).
//!
//! Single-shot high-precision measurements.  Every 16-bit word on the wire
//! is followed by a Sensirion CRC-8; a failed CRC discards the reading.
//!
//! Protocol functions are generic over [`embedded_hal::i2c::I2c`] so the
//! frame handling can be exercised with a scripted bus in tests.

use core::time::Duration;

use embedded_hal::i2c::I2c;

use crate::sensors::sensirion_crc8;

pub const SHT40_ADDR: u8 = 0x44;

const CMD_SOFT_RESET: u8 = 0x94;
const CMD_MEASURE_HIGH_PRECISION: u8 = 0xFD;

/// Max measurement duration is 8.3 ms at high precision.
const MEASURE_DELAY_MS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sht40Reading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

pub struct Sht40;

impl Sht40 {
    pub fn new() -> Self {
        Self
    }

    /// Soft-reset the part.  An ACK on the reset command is the presence
    /// probe; the part needs ~1 ms before accepting the next command.
    pub fn init<I: I2c>(&mut self, i2c: &mut I) -> bool {
        if i2c.write(SHT40_ADDR, &[CMD_SOFT_RESET]).is_err() {
            return false;
        }
        std::thread::sleep(Duration::from_millis(1));
        true
    }

    /// One high-precision measurement: command, conversion wait, 6-byte read.
    pub fn read<I: I2c>(&mut self, i2c: &mut I) -> Option<Sht40Reading> {
        i2c.write(SHT40_ADDR, &[CMD_MEASURE_HIGH_PRECISION]).ok()?;
        std::thread::sleep(Duration::from_millis(MEASURE_DELAY_MS));
        let mut buf = [0u8; 6];
        i2c.read(SHT40_ADDR, &mut buf).ok()?;
        parse_measurement(&buf)
    }
}

impl Default for Sht40 {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a 6-byte measurement frame: `[t_msb t_lsb t_crc rh_msb rh_lsb rh_crc]`.
///
/// Conversion per datasheet: `T = -45 + 175·St/65535`, `RH = -6 + 125·Srh/65535`,
/// with RH clamped to 0–100 % (the raw formula can stray slightly outside).
pub fn parse_measurement(buf: &[u8; 6]) -> Option<Sht40Reading> {
    if sensirion_crc8(&buf[0..2]) != buf[2] || sensirion_crc8(&buf[3..5]) != buf[5] {
        return None;
    }
    let t_ticks = u16::from_be_bytes([buf[0], buf[1]]) as f32;
    let rh_ticks = u16::from_be_bytes([buf[3], buf[4]]) as f32;
    Some(Sht40Reading {
        temperature_c: -45.0 + 175.0 * t_ticks / 65535.0,
        humidity_pct: (-6.0 + 125.0 * rh_ticks / 65535.0).clamp(0.0, 100.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::testing::ScriptedI2c;

    fn frame(t_ticks: u16, rh_ticks: u16) -> [u8; 6] {
        let t = t_ticks.to_be_bytes();
        let rh = rh_ticks.to_be_bytes();
        [
            t[0],
            t[1],
            sensirion_crc8(&t),
            rh[0],
            rh[1],
            sensirion_crc8(&rh),
        ]
    }

    #[test]
    fn parses_midscale_measurement() {
        let r = parse_measurement(&frame(0x8000, 0x8000)).unwrap();
        assert!((r.temperature_c - 42.5).abs() < 0.05);
        assert!((r.humidity_pct - 56.5).abs() < 0.05);
    }

    #[test]
    fn rejects_corrupted_crc() {
        let mut f = frame(0x8000, 0x8000);
        f[2] ^= 0xFF;
        assert!(parse_measurement(&f).is_none());
    }

    #[test]
    fn clamps_humidity_to_valid_range() {
        let low = parse_measurement(&frame(0x0000, 0x0000)).unwrap();
        assert_eq!(low.humidity_pct, 0.0);
        let high = parse_measurement(&frame(0x0000, 0xFFFF)).unwrap();
        assert_eq!(high.humidity_pct, 100.0);
    }

    #[test]
    fn read_issues_measure_command_and_parses_response() {
        let mut i2c = ScriptedI2c::new();
        i2c.queue_read(frame(0x8000, 0x8000).to_vec());
        let r = Sht40::new().read(&mut i2c).unwrap();
        assert!((r.temperature_c - 42.5).abs() < 0.05);
        assert_eq!(i2c.writes, vec![(SHT40_ADDR, vec![CMD_MEASURE_HIGH_PRECISION])]);
    }

    #[test]
    fn read_fails_cleanly_on_nack() {
        let mut i2c = ScriptedI2c::new();
        i2c.fail_writes = true;
        assert!(Sht40::new().read(&mut i2c).is_none());
        assert!(!Sht40::new().init(&mut i2c));
    }
}
