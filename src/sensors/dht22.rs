//! DHT22 (AM2302) temperature/humidity sensor — single-wire on GPIO 4.
//!
//! The host drives the line low for ~1 ms, releases it, and the sensor
//! answers with 40 bits: humidity ×10, temperature ×10 (sign in the top
//! bit), and a byte-sum checksum.  Bit values are distinguished by the
//! high-pulse width (~27 µs = 0, ~70 µs = 1).
//!
//! The read is a busy-waited timing loop on the main task; if the
//! scheduler preempts it mid-frame the checksum fails and the read
//! reports `None`, to be retried at the next poll.  Both channels come
//! from one frame, so temperature (the unit's first channel) triggers
//! acquisition and humidity reports from the same sample.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dht22Reading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

pub struct Dht22 {
    last: Option<Dht22Reading>,
}

impl Dht22 {
    pub fn new() -> Self {
        Self { last: None }
    }
}

impl Default for Dht22 {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode the 5-byte frame `[hum_hi hum_lo temp_hi temp_lo checksum]`.
pub fn decode_frame(bytes: &[u8; 5]) -> Option<Dht22Reading> {
    let sum = bytes[0]
        .wrapping_add(bytes[1])
        .wrapping_add(bytes[2])
        .wrapping_add(bytes[3]);
    if sum != bytes[4] {
        return None;
    }
    let humidity_pct = u16::from_be_bytes([bytes[0], bytes[1]]) as f32 / 10.0;
    let temp_raw = u16::from_be_bytes([bytes[2], bytes[3]]);
    let magnitude = (temp_raw & 0x7FFF) as f32 / 10.0;
    let temperature_c = if temp_raw & 0x8000 != 0 { -magnitude } else { magnitude };
    Some(Dht22Reading {
        temperature_c,
        humidity_pct,
    })
}

#[cfg(target_os = "espidf")]
mod target {
    use esp_idf_svc::sys::*;
    use log::info;

    use super::{decode_frame, Dht22, Dht22Reading};
    use crate::pins;
    use crate::registry::Channel;
    use crate::sensors::wait_for_level;

    /// High-pulse width separating a 0-bit (~27 µs) from a 1-bit (~70 µs).
    const BIT_THRESHOLD_US: i64 = 45;

    impl Dht22 {
        /// Configure the pin and attempt one frame.  The part wants 2 s
        /// between reads; boot-time bus/WiFi bring-up provides that.
        pub fn init(&mut self) -> bool {
            let cfg = gpio_config_t {
                pin_bit_mask: 1u64 << pins::DHT_GPIO,
                mode: gpio_mode_t_GPIO_MODE_INPUT,
                pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
                pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
            };
            // SAFETY: gpio_config on a dedicated pin, called from the main task.
            let ret = unsafe { gpio_config(&cfg) };
            if ret != ESP_OK {
                return false;
            }
            info!("dht22: pin {} configured", pins::DHT_GPIO);
            self.last = self.acquire();
            self.last.is_some()
        }

        pub fn read_channel(&mut self, channel: Channel) -> Option<f32> {
            if channel == Channel::Temperature {
                self.last = self.acquire();
            }
            let r = self.last?;
            match channel {
                Channel::Temperature => Some(r.temperature_c),
                Channel::Humidity => Some(r.humidity_pct),
                _ => None,
            }
        }

        fn acquire(&mut self) -> Option<Dht22Reading> {
            let mut bytes = [0u8; 5];
            // SAFETY: raw GPIO/timer register access on the dedicated DHT
            // pin, main task only.  The line is open-drain with an external
            // pull-up, so driving low then switching to input releases it.
            unsafe {
                gpio_set_direction(pins::DHT_GPIO, gpio_mode_t_GPIO_MODE_OUTPUT_OD);
                gpio_set_level(pins::DHT_GPIO, 0);
                esp_rom_delay_us(1100);
                gpio_set_level(pins::DHT_GPIO, 1);
                gpio_set_direction(pins::DHT_GPIO, gpio_mode_t_GPIO_MODE_INPUT);

                // Sensor response preamble: ~80 µs low, ~80 µs high.
                wait_for_level(pins::DHT_GPIO, 0, 100)?;
                wait_for_level(pins::DHT_GPIO, 1, 120)?;
                wait_for_level(pins::DHT_GPIO, 0, 120)?;

                for bit in 0..40 {
                    // 50 µs low preamble, then the width-coded high pulse.
                    wait_for_level(pins::DHT_GPIO, 1, 80)?;
                    let high_us = wait_for_level(pins::DHT_GPIO, 0, 120)?;
                    if high_us > BIT_THRESHOLD_US {
                        bytes[bit / 8] |= 0x80 >> (bit % 8);
                    }
                }
            }
            decode_frame(&bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(bytes: [u8; 4]) -> [u8; 5] {
        let ck = bytes
            .iter()
            .fold(0u8, |a, b| a.wrapping_add(*b));
        [bytes[0], bytes[1], bytes[2], bytes[3], ck]
    }

    #[test]
    fn decodes_datasheet_example() {
        // 65.2 %RH, 35.1 °C
        let r = decode_frame(&frame([0x02, 0x8C, 0x01, 0x5F])).unwrap();
        assert_eq!(r.humidity_pct, 65.2);
        assert_eq!(r.temperature_c, 35.1);
    }

    #[test]
    fn decodes_negative_temperature() {
        // Top bit of the temperature word is the sign, not two's complement.
        let r = decode_frame(&frame([0x01, 0x90, 0x80, 0x65])).unwrap();
        assert_eq!(r.humidity_pct, 40.0);
        assert_eq!(r.temperature_c, -10.1);
    }

    #[test]
    fn rejects_bad_checksum() {
        let mut f = frame([0x02, 0x8C, 0x01, 0x5F]);
        f[4] = f[4].wrapping_add(1);
        assert!(decode_frame(&f).is_none());
    }
}
