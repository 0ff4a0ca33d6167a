//! Fuzz target: SHDLC frame parsing
//!
//! Feeds arbitrary byte sequences into `shdlc_parse` and the measurement
//! payload decoder, asserting that malformed frames are rejected rather
//! than panicking and that an accepted payload fits the frame buffer its
//! length byte declared.
//!
//! cargo fuzz run fuzz_shdlc_decoder

#![no_main]

use airnode::sensors::sps30::{parse_measurement, shdlc_parse};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Some((_cmd, _state, payload)) = shdlc_parse(data) {
        assert!(payload.len() <= 48, "payload exceeds the frame buffer");
        let _ = parse_measurement(&payload);
    }

    // The float decoder must also hold up against raw garbage.
    let _ = parse_measurement(data);
});
