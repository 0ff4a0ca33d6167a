//! Bosch BMP280 barometer (I²C, main bus, addr 0x76).
//!
//! Normal-mode operation: pressure ×16 / temperature ×2 oversampling with
//! the IIR filter at 16, so a burst read of `0xF7..0xFC` always returns
//! the latest filtered sample.  Compensation uses the datasheet's integer
//! formulas (i32 temperature, i64 Q24.8 pressure) with the calibration
//! words captured once at init.

use embedded_hal::i2c::I2c;

pub const BMP280_ADDR: u8 = 0x76;

/// Fixed chip-id of the BMP280 (reg 0xD0).
const CHIP_ID: u8 = 0x58;

const REG_CHIP_ID: u8 = 0xD0;
const REG_CALIB_START: u8 = 0x88;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_CONFIG: u8 = 0xF5;
const REG_DATA_START: u8 = 0xF7;

/// osrs_t ×2, osrs_p ×16, normal mode.
const CTRL_MEAS_NORMAL: u8 = 0x57;
/// t_standby 500 ms, IIR filter coefficient 16.
const CONFIG_FILTERED: u8 = 0x90;

/// Trimming parameters from the factory-programmed NVM (0x88..0x9F, LE).
#[derive(Debug, Clone, Copy)]
pub struct Calibration {
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,
    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,
}

pub struct Bmp280 {
    cal: Option<Calibration>,
}

impl Bmp280 {
    pub fn new() -> Self {
        Self { cal: None }
    }

    /// Probe the chip id, capture calibration, and enter normal mode.
    pub fn init<I: I2c>(&mut self, i2c: &mut I) -> bool {
        self.cal = None;
        let mut id = [0u8; 1];
        if i2c.write_read(BMP280_ADDR, &[REG_CHIP_ID], &mut id).is_err() || id[0] != CHIP_ID {
            return false;
        }
        let mut raw = [0u8; 24];
        if i2c.write_read(BMP280_ADDR, &[REG_CALIB_START], &mut raw).is_err() {
            return false;
        }
        if i2c.write(BMP280_ADDR, &[REG_CONFIG, CONFIG_FILTERED]).is_err()
            || i2c.write(BMP280_ADDR, &[REG_CTRL_MEAS, CTRL_MEAS_NORMAL]).is_err()
        {
            return false;
        }
        self.cal = Some(parse_calibration(&raw));
        true
    }

    /// Pressure in hPa.
    pub fn read_pressure<I: I2c>(&mut self, i2c: &mut I) -> Option<f32> {
        let cal = self.cal?;
        let (adc_p, adc_t) = read_raw_sample(i2c)?;
        let (_, t_fine) = compensate_temperature(adc_t, &cal);
        let pa_q24_8 = compensate_pressure(adc_p, t_fine, &cal)?;
        Some(pa_q24_8 as f32 / 256.0 / 100.0)
    }

    /// Die temperature in °C.  Runs warm relative to ambient under the
    /// oversampling load; still published for the barometer's own channel.
    pub fn read_temperature<I: I2c>(&mut self, i2c: &mut I) -> Option<f32> {
        let cal = self.cal?;
        let (_, adc_t) = read_raw_sample(i2c)?;
        let (centi_c, _) = compensate_temperature(adc_t, &cal);
        Some(centi_c as f32 / 100.0)
    }
}

impl Default for Bmp280 {
    fn default() -> Self {
        Self::new()
    }
}

/// Burst read of the 6-byte data block: 20-bit pressure then temperature.
fn read_raw_sample<I: I2c>(i2c: &mut I) -> Option<(i32, i32)> {
    let mut buf = [0u8; 6];
    i2c.write_read(BMP280_ADDR, &[REG_DATA_START], &mut buf).ok()?;
    let adc_p = (i32::from(buf[0]) << 12) | (i32::from(buf[1]) << 4) | (i32::from(buf[2]) >> 4);
    let adc_t = (i32::from(buf[3]) << 12) | (i32::from(buf[4]) << 4) | (i32::from(buf[5]) >> 4);
    Some((adc_p, adc_t))
}

pub fn parse_calibration(raw: &[u8; 24]) -> Calibration {
    let u = |i: usize| u16::from_le_bytes([raw[i], raw[i + 1]]);
    let s = |i: usize| i16::from_le_bytes([raw[i], raw[i + 1]]);
    Calibration {
        dig_t1: u(0),
        dig_t2: s(2),
        dig_t3: s(4),
        dig_p1: u(6),
        dig_p2: s(8),
        dig_p3: s(10),
        dig_p4: s(12),
        dig_p5: s(14),
        dig_p6: s(16),
        dig_p7: s(18),
        dig_p8: s(20),
        dig_p9: s(22),
    }
}

/// Datasheet `bmp280_compensate_T_int32`: returns (centi-degrees, t_fine).
pub fn compensate_temperature(adc_t: i32, cal: &Calibration) -> (i32, i32) {
    let var1 = (((adc_t >> 3) - ((cal.dig_t1 as i32) << 1)) * (cal.dig_t2 as i32)) >> 11;
    let var2 = (((((adc_t >> 4) - (cal.dig_t1 as i32)) * ((adc_t >> 4) - (cal.dig_t1 as i32)))
        >> 12)
        * (cal.dig_t3 as i32))
        >> 14;
    let t_fine = var1 + var2;
    ((t_fine * 5 + 128) >> 8, t_fine)
}

/// Datasheet `bmp280_compensate_P_int64`: Pa in Q24.8, `None` when the
/// divisor degenerates (all-zero calibration).
pub fn compensate_pressure(adc_p: i32, t_fine: i32, cal: &Calibration) -> Option<u32> {
    let mut var1 = i64::from(t_fine) - 128_000;
    let mut var2 = var1 * var1 * i64::from(cal.dig_p6);
    var2 += (var1 * i64::from(cal.dig_p5)) << 17;
    var2 += i64::from(cal.dig_p4) << 35;
    var1 = ((var1 * var1 * i64::from(cal.dig_p3)) >> 8) + ((var1 * i64::from(cal.dig_p2)) << 12);
    var1 = (((1i64 << 47) + var1) * i64::from(cal.dig_p1)) >> 33;
    if var1 == 0 {
        return None;
    }
    let mut p = 1_048_576 - i64::from(adc_p);
    p = (((p << 31) - var2) * 3125) / var1;
    var1 = (i64::from(cal.dig_p9) * (p >> 13) * (p >> 13)) >> 25;
    var2 = (i64::from(cal.dig_p8) * p) >> 19;
    p = ((p + var1 + var2) >> 8) + (i64::from(cal.dig_p7) << 4);
    Some(p as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::testing::ScriptedI2c;

    /// Worked example from the datasheet (§3.12): expected outputs are
    /// 25.08 °C and 100653.27 Pa.
    fn datasheet_cal() -> Calibration {
        Calibration {
            dig_t1: 27504,
            dig_t2: 26435,
            dig_t3: -1000,
            dig_p1: 36477,
            dig_p2: -10685,
            dig_p3: 3024,
            dig_p4: 2855,
            dig_p5: 140,
            dig_p6: -7,
            dig_p7: 15500,
            dig_p8: -14600,
            dig_p9: 6000,
        }
    }

    #[test]
    fn temperature_matches_datasheet_example() {
        let (centi_c, t_fine) = compensate_temperature(519_888, &datasheet_cal());
        assert_eq!(centi_c, 2508);
        assert_eq!(t_fine, 128_422);
    }

    #[test]
    fn pressure_matches_datasheet_example() {
        let cal = datasheet_cal();
        let (_, t_fine) = compensate_temperature(519_888, &cal);
        let pa = compensate_pressure(415_148, t_fine, &cal).unwrap() as f32 / 256.0;
        assert!((pa - 100_653.27).abs() < 15.0, "got {pa} Pa");
    }

    #[test]
    fn pressure_rejects_zero_divisor() {
        let mut cal = datasheet_cal();
        cal.dig_p1 = 0;
        assert_eq!(compensate_pressure(415_148, 128_422, &cal), None);
    }

    #[test]
    fn calibration_parses_little_endian() {
        let mut raw = [0u8; 24];
        raw[0] = 0x70; // dig_t1 = 27504 = 0x6B70
        raw[1] = 0x6B;
        raw[16] = 0xF9; // dig_p6 = -7
        raw[17] = 0xFF;
        let cal = parse_calibration(&raw);
        assert_eq!(cal.dig_t1, 27504);
        assert_eq!(cal.dig_p6, -7);
    }

    #[test]
    fn init_rejects_wrong_chip_id() {
        let mut i2c = ScriptedI2c::new();
        i2c.queue_read(vec![0x60]); // BME280 id
        assert!(!Bmp280::new().init(&mut i2c));
    }

    #[test]
    fn read_without_init_returns_none() {
        let mut i2c = ScriptedI2c::new();
        assert!(Bmp280::new().read_pressure(&mut i2c).is_none());
    }
}
