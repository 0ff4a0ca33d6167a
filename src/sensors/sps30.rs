//! Sensirion SPS30 particulate sensor (UART1, 115200 8N1, SHDLC framing).
//!
//! SHDLC frames are `7E <content> 7E` where content is byte-stuffed
//! (`7E→7D 5E`, `7D→7D 5D`, `11→7D 31`, `13→7D 33`) and ends with the
//! inverted-sum checksum.  Measurements are requested in IEEE754
//! big-endian float format; the response carries ten floats of which we
//! publish the four mass concentrations.
//!
//! One exchange yields all four PM channels, so the unit's first channel
//! (pm1) triggers acquisition and the remaining channels report from the
//! same sample.

use crate::registry::Channel;

const FRAME_DELIMITER: u8 = 0x7E;
const ESCAPE: u8 = 0x7D;

const CMD_START_MEASUREMENT: u8 = 0x00;
const CMD_STOP_MEASUREMENT: u8 = 0x01;
const CMD_READ_MEASUREMENT: u8 = 0x03;

/// Start-measurement argument: subcommand 0x01, big-endian float output.
const START_ARGS: [u8; 2] = [0x01, 0x03];

/// FreeRTOS ticks, 10 ms each at the default 100 Hz tick rate.
#[cfg(target_os = "espidf")]
const RESPONSE_TIMEOUT_TICKS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PmReading {
    pub pm1: f32,
    pub pm25: f32,
    pub pm4: f32,
    pub pm10: f32,
}

pub struct Sps30 {
    last: Option<PmReading>,
}

impl Sps30 {
    pub fn new() -> Self {
        Self { last: None }
    }
}

impl Default for Sps30 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "espidf")]
impl Sps30 {
    /// Stop any measurement left running from a previous boot, then start
    /// a fresh one in float format.
    pub fn init(&mut self, uart: &esp_idf_hal::uart::UartDriver<'_>) -> bool {
        self.last = None;
        let _ = self.exchange(uart, CMD_STOP_MEASUREMENT, &[]);
        match self.exchange(uart, CMD_START_MEASUREMENT, &START_ARGS) {
            Some((state, _)) => state == 0,
            None => false,
        }
    }

    pub fn read_channel(
        &mut self,
        uart: &esp_idf_hal::uart::UartDriver<'_>,
        channel: Channel,
    ) -> Option<f32> {
        if channel == Channel::Pm1 {
            self.last = self.acquire(uart);
        }
        let r = self.last?;
        match channel {
            Channel::Pm1 => Some(r.pm1),
            Channel::Pm25 => Some(r.pm25),
            Channel::Pm4 => Some(r.pm4),
            Channel::Pm10 => Some(r.pm10),
            _ => None,
        }
    }

    fn acquire(&mut self, uart: &esp_idf_hal::uart::UartDriver<'_>) -> Option<PmReading> {
        let (state, data) = self.exchange(uart, CMD_READ_MEASUREMENT, &[])?;
        if state != 0 {
            return None;
        }
        parse_measurement(&data)
    }

    /// One command/response round trip; returns `(state, data)`.
    fn exchange(
        &mut self,
        uart: &esp_idf_hal::uart::UartDriver<'_>,
        cmd: u8,
        args: &[u8],
    ) -> Option<(u8, heapless::Vec<u8, 48>)> {
        crate::sensors::uart_drain(uart);
        let frame = shdlc_build(cmd, args)?;
        uart.write(&frame).ok()?;

        let mut raw = [0u8; 128];
        let len = self.read_frame(uart, &mut raw)?;
        let (resp_cmd, state, data) = shdlc_parse(&raw[..len])?;
        if resp_cmd != cmd {
            return None;
        }
        Some((state, data))
    }

    /// Accumulate bytes until the closing delimiter arrives.
    fn read_frame(
        &mut self,
        uart: &esp_idf_hal::uart::UartDriver<'_>,
        buf: &mut [u8; 128],
    ) -> Option<usize> {
        let mut filled = 0;
        let mut delimiters = 0;
        while filled < buf.len() {
            match uart.read(&mut buf[filled..filled + 1], RESPONSE_TIMEOUT_TICKS) {
                Ok(1) => {}
                _ => return None,
            }
            if buf[filled] == FRAME_DELIMITER {
                delimiters += 1;
            }
            filled += 1;
            if delimiters == 2 {
                return Some(filled);
            }
        }
        None
    }
}

// ── SHDLC framing ─────────────────────────────────────────────

/// Inverted least-significant byte of the content sum.
pub fn shdlc_checksum(content: &[u8]) -> u8 {
    !content.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

fn push_stuffed(out: &mut heapless::Vec<u8, 96>, byte: u8) -> Option<()> {
    match byte {
        0x7E | 0x7D | 0x11 | 0x13 => {
            out.push(ESCAPE).ok()?;
            out.push(byte ^ 0x20).ok()?;
        }
        b => out.push(b).ok()?,
    }
    Some(())
}

/// Build a MOSI frame: delimiter, stuffed `[addr cmd len data.. chk]`, delimiter.
pub fn shdlc_build(cmd: u8, data: &[u8]) -> Option<heapless::Vec<u8, 96>> {
    if data.len() > 40 {
        return None;
    }
    let mut content: heapless::Vec<u8, 48> = heapless::Vec::new();
    content.push(0x00).ok()?; // device address
    content.push(cmd).ok()?;
    content.push(data.len() as u8).ok()?;
    content.extend_from_slice(data).ok()?;
    let chk = shdlc_checksum(&content);

    let mut out: heapless::Vec<u8, 96> = heapless::Vec::new();
    out.push(FRAME_DELIMITER).ok()?;
    for &b in &content {
        push_stuffed(&mut out, b)?;
    }
    push_stuffed(&mut out, chk)?;
    out.push(FRAME_DELIMITER).ok()?;
    Some(out)
}

/// Unstuff and validate a MISO frame; returns `(cmd, state, data)`.
pub fn shdlc_parse(raw: &[u8]) -> Option<(u8, u8, heapless::Vec<u8, 48>)> {
    if raw.len() < 7 || raw[0] != FRAME_DELIMITER || raw[raw.len() - 1] != FRAME_DELIMITER {
        return None;
    }

    let mut content: heapless::Vec<u8, 64> = heapless::Vec::new();
    let mut escaped = false;
    for &b in &raw[1..raw.len() - 1] {
        if escaped {
            content.push(b ^ 0x20).ok()?;
            escaped = false;
        } else if b == ESCAPE {
            escaped = true;
        } else {
            content.push(b).ok()?;
        }
    }
    // content = [addr cmd state len data.. chk]
    if escaped || content.len() < 5 {
        return None;
    }
    let (body, chk) = content.split_at(content.len() - 1);
    if shdlc_checksum(body) != chk[0] {
        return None;
    }
    let (cmd, state, len) = (body[1], body[2], body[3] as usize);
    if body.len() != 4 + len {
        return None;
    }
    let mut data: heapless::Vec<u8, 48> = heapless::Vec::new();
    data.extend_from_slice(&body[4..]).ok()?;
    Some((cmd, state, data))
}

/// The measurement payload is ten big-endian floats; the first four are
/// the mass concentrations in µg/m³.
pub fn parse_measurement(data: &[u8]) -> Option<PmReading> {
    if data.len() < 16 {
        return None;
    }
    let f = |i: usize| f32::from_be_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);
    Some(PmReading {
        pm1: f(0),
        pm25: f(4),
        pm4: f(8),
        pm10: f(12),
    })
}
