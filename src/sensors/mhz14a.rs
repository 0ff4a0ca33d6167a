//! Winsen MH-Z14A NDIR CO₂ sensor (UART2, 9600 8N1, Q&A mode).
//!
//! One reading is one 9-byte command/response exchange:
//!
//! ```text
//!   → FF 01 86 00 00 00 00 00 79          (read concentration)
//!   ← FF 86 HH LL -- -- -- -- CK          (ppm = HH·256 + LL)
//! ```
//!
//! `CK` is the Winsen two's-complement checksum over bytes 1..8.  Frame
//! build/parse are pure functions; only the exchange itself touches the
//! UART and is therefore target-gated.

use crate::sensors::winsen_checksum;

pub const READ_CMD: [u8; 9] = [0xFF, 0x01, 0x86, 0x00, 0x00, 0x00, 0x00, 0x00, 0x79];

const RESPONSE_HEADER: u8 = 0xFF;
const RESPONSE_CMD: u8 = 0x86;

/// FreeRTOS ticks, 10 ms each at the default 100 Hz tick rate.
#[cfg(target_os = "espidf")]
const RESPONSE_TIMEOUT_TICKS: u32 = 20;

pub struct Mhz14a;

impl Mhz14a {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Mhz14a {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "espidf")]
impl Mhz14a {
    /// A successful exchange is the presence probe.
    pub fn init(&mut self, uart: &esp_idf_hal::uart::UartDriver<'_>) -> bool {
        self.transact(uart).is_some()
    }

    pub fn read_co2(&mut self, uart: &esp_idf_hal::uart::UartDriver<'_>) -> Option<f32> {
        self.transact(uart).map(f32::from)
    }

    fn transact(&mut self, uart: &esp_idf_hal::uart::UartDriver<'_>) -> Option<u16> {
        crate::sensors::uart_drain(uart);
        uart.write(&READ_CMD).ok()?;
        let mut resp = [0u8; 9];
        match uart.read(&mut resp, RESPONSE_TIMEOUT_TICKS) {
            Ok(9) => parse_response(&resp),
            _ => None,
        }
    }
}

/// Validate header and checksum, extract the ppm word.
pub fn parse_response(resp: &[u8; 9]) -> Option<u16> {
    if resp[0] != RESPONSE_HEADER || resp[1] != RESPONSE_CMD {
        return None;
    }
    if winsen_checksum(resp) != resp[8] {
        return None;
    }
    Some(u16::from_be_bytes([resp[2], resp[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn response(ppm: u16) -> [u8; 9] {
        let be = ppm.to_be_bytes();
        let mut resp = [RESPONSE_HEADER, RESPONSE_CMD, be[0], be[1], 0, 0, 0, 0, 0];
        resp[8] = winsen_checksum(&resp);
        resp
    }

    #[test]
    fn read_command_checksum_matches_datasheet() {
        assert_eq!(winsen_checksum(&READ_CMD), 0x79);
    }

    #[test]
    fn parses_valid_response() {
        assert_eq!(parse_response(&response(410)), Some(410));
        assert_eq!(parse_response(&response(5000)), Some(5000));
    }

    #[test]
    fn rejects_wrong_header() {
        let mut resp = response(410);
        resp[0] = 0x00;
        assert!(parse_response(&resp).is_none());
    }

    #[test]
    fn rejects_corrupted_checksum() {
        let mut resp = response(410);
        resp[8] = resp[8].wrapping_add(1);
        assert!(parse_response(&resp).is_none());
    }
}
