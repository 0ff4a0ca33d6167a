//! SC16 electrochemical CO sensor — bit-banged serial on GPIO 14/12.
//!
//! Speaks the same Winsen Q&A framing as the MH-Z14A (9-byte frames,
//! two's-complement checksum), so the frame parser is shared; only the
//! transport differs.  Counts are tenths of a ppm.
//!
//! With all three hardware UARTs taken (console, SPS30, MH-Z14A) the
//! exchange runs as a software UART at 9600 baud: a busy-waited timing
//! loop on the main task, ~20 ms per poll.  A preempted exchange fails
//! the checksum and reports `None`, to be retried at the next poll.

pub const PPM_PER_COUNT: f32 = 0.1;

pub struct Sc16Co;

impl Sc16Co {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Sc16Co {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "espidf")]
mod target {
    use esp_idf_svc::sys::*;
    use log::info;

    use super::{Sc16Co, PPM_PER_COUNT};
    use crate::pins;
    use crate::sensors::mhz14a::{parse_response, READ_CMD};
    use crate::sensors::wait_for_level;

    /// One bit at 9600 baud.
    const BIT_US: u32 = 104;
    /// Wait budget for the first response byte.
    const FIRST_BYTE_TIMEOUT_US: i64 = 100_000;
    /// Subsequent bytes follow back-to-back; allow a small inter-byte gap.
    const NEXT_BYTE_TIMEOUT_US: i64 = 2_000;

    impl Sc16Co {
        pub fn init(&mut self) -> bool {
            let tx_cfg = gpio_config_t {
                pin_bit_mask: 1u64 << pins::CO_TX_GPIO,
                mode: gpio_mode_t_GPIO_MODE_OUTPUT,
                pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
                pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
            };
            let rx_cfg = gpio_config_t {
                pin_bit_mask: 1u64 << pins::CO_RX_GPIO,
                mode: gpio_mode_t_GPIO_MODE_INPUT,
                pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
                pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
            };
            // SAFETY: gpio_config on dedicated pins, called from the main task.
            unsafe {
                if gpio_config(&tx_cfg) != ESP_OK || gpio_config(&rx_cfg) != ESP_OK {
                    return false;
                }
                // Idle-high TX, give the line a moment to settle.
                gpio_set_level(pins::CO_TX_GPIO, 1);
                esp_rom_delay_us(10 * BIT_US);
            }
            info!(
                "sc16co: software UART on tx={} rx={}",
                pins::CO_TX_GPIO,
                pins::CO_RX_GPIO
            );
            self.transact().is_some()
        }

        pub fn read_co(&mut self) -> Option<f32> {
            self.transact().map(|counts| f32::from(counts) * PPM_PER_COUNT)
        }

        fn transact(&mut self) -> Option<u16> {
            let mut resp = [0u8; 9];
            // SAFETY: bit-bang on the dedicated CO pins, main task only.
            unsafe {
                for &b in &READ_CMD {
                    tx_byte(b);
                }
                let mut timeout = FIRST_BYTE_TIMEOUT_US;
                for slot in &mut resp {
                    *slot = rx_byte(timeout)?;
                    timeout = NEXT_BYTE_TIMEOUT_US;
                }
            }
            parse_response(&resp)
        }
    }

    /// SAFETY: TX pin configured as output by `init`; main task only.
    unsafe fn tx_byte(b: u8) {
        unsafe {
            gpio_set_level(pins::CO_TX_GPIO, 0); // start bit
            esp_rom_delay_us(BIT_US);
            for i in 0..8 {
                gpio_set_level(pins::CO_TX_GPIO, u32::from((b >> i) & 1));
                esp_rom_delay_us(BIT_US);
            }
            gpio_set_level(pins::CO_TX_GPIO, 1); // stop bit
            esp_rom_delay_us(BIT_US);
        }
    }

    /// Wait for a start bit, then sample 8 data bits at bit centres.
    ///
    /// SAFETY: RX pin configured as input by `init`; main task only.
    unsafe fn rx_byte(timeout_us: i64) -> Option<u8> {
        unsafe {
            wait_for_level(pins::CO_RX_GPIO, 0, timeout_us)?;
            esp_rom_delay_us(BIT_US / 2);
            if gpio_get_level(pins::CO_RX_GPIO) != 0 {
                return None; // glitch, not a start bit
            }
            let mut b = 0u8;
            for i in 0..8 {
                esp_rom_delay_us(BIT_US);
                if gpio_get_level(pins::CO_RX_GPIO) == 1 {
                    b |= 1 << i;
                }
            }
            esp_rom_delay_us(BIT_US); // stop bit
            Some(b)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::mhz14a::parse_response;
    use crate::sensors::winsen_checksum;

    #[test]
    fn shares_winsen_framing_with_mhz14a() {
        // 57 counts = 5.7 ppm once scaled.
        let mut resp = [0xFF, 0x86, 0x00, 0x39, 0, 0, 0, 0, 0];
        resp[8] = winsen_checksum(&resp);
        assert_eq!(parse_response(&resp), Some(57));
        assert!((f32::from(57u16) * PPM_PER_COUNT - 5.7).abs() < 1e-6);
    }
}
