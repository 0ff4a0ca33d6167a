//! Config-key alias resolution.
//!
//! The remote configuration payload addresses measured quantities by name,
//! and most quantities answer to two generations of names: a
//! hardware-qualified key (`"dht22:temperature"`) introduced when the
//! second temperature-capable unit was fitted, and the legacy bare key
//! (`"temperature"`) that older dashboards still send. Each quantity owns
//! an ordered cascade of keys; the specific keys come first.
//!
//! Resolution is first-present-key-wins: the cascade stops at the first
//! key that appears in the payload, even when its value turns out to be
//! invalid. A later key never overrides an earlier one. This keeps mixed
//! old/new payloads deterministic.

use serde_json::{Map, Value};

use crate::config::MIN_INTERVAL_SECS;
use crate::registry::HardwareId;

// ---------------------------------------------------------------------------
// Quantity identity
// ---------------------------------------------------------------------------

/// The configurable quantities. More quantities than hardware units:
/// several quantities share one unit's interval slot (the unit is polled
/// as a whole, so its channels cannot tick on different periods).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Quantity {
    Co2 = 0,
    Temperature = 1,
    Humidity = 2,
    Voc = 3,
    Pressure = 4,
    Eco2 = 5,
    Tvoc = 6,
    ShtTempHum = 7,
    Pm = 8,
    Co = 9,
}

/// Number of configurable quantities.
pub const QUANTITY_COUNT: usize = 10;

impl Quantity {
    /// Short name used in log lines.
    pub fn name(self) -> &'static str {
        match self {
            Self::Co2 => "co2",
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Voc => "voc",
            Self::Pressure => "pressure",
            Self::Eco2 => "eco2",
            Self::Tvoc => "tvoc",
            Self::ShtTempHum => "sht temp/hum",
            Self::Pm => "pm",
            Self::Co => "co",
        }
    }
}

// ---------------------------------------------------------------------------
// Alias table
// ---------------------------------------------------------------------------

/// One quantity's key cascade and the unit whose interval it steers.
pub struct Alias {
    pub quantity: Quantity,
    /// Keys in priority order: hardware-qualified first, legacy last.
    pub keys: &'static [&'static str],
    /// The interval slot written on acceptance.
    pub target: HardwareId,
}

/// The full cascade table. Order of entries is the handler's scan order;
/// it is not semantically significant because each payload key belongs to
/// at most one cascade.
pub const ALIASES: [Alias; QUANTITY_COUNT] = [
    Alias {
        quantity: Quantity::Co2,
        keys: &["mhz14a:co2", "co2"],
        target: HardwareId::Mhz14a,
    },
    Alias {
        quantity: Quantity::Temperature,
        keys: &["dht22:temperature", "temperature"],
        target: HardwareId::Dht22,
    },
    Alias {
        quantity: Quantity::Humidity,
        keys: &["dht22:humidity", "humidity"],
        target: HardwareId::Dht22,
    },
    Alias {
        quantity: Quantity::Voc,
        keys: &["sgp40:voc", "voc"],
        target: HardwareId::Sgp40,
    },
    // The barometer is one unit: both of its channel keys land on the same
    // interval slot, so whichever key the payload carries first wins.
    Alias {
        quantity: Quantity::Pressure,
        keys: &["bmp280:pressure", "bmp280:temperature", "pressure"],
        target: HardwareId::Bmp280,
    },
    Alias {
        quantity: Quantity::Eco2,
        keys: &["sgp30:eco2", "eco2"],
        target: HardwareId::Sgp30,
    },
    Alias {
        quantity: Quantity::Tvoc,
        keys: &["sgp30:tvoc", "tvoc"],
        target: HardwareId::Sgp30,
    },
    Alias {
        quantity: Quantity::ShtTempHum,
        keys: &["sht40:temperature", "sht40:humidity", "temp_sht", "hum_sht"],
        target: HardwareId::Sht40,
    },
    Alias {
        quantity: Quantity::Pm,
        keys: &["sps30:pm", "pm"],
        target: HardwareId::Sps30,
    },
    Alias {
        quantity: Quantity::Co,
        keys: &["sc16co:co", "co"],
        target: HardwareId::Sc16co,
    },
];

// ---------------------------------------------------------------------------
// Reset targets
// ---------------------------------------------------------------------------

/// Names accepted by the reset command for one unit, besides `"all"`.
/// Canonical hardware ids are always accepted; the rest are the names the
/// legacy dashboards send. Matching is case-sensitive.
pub fn reset_targets(hw: HardwareId) -> &'static [&'static str] {
    match hw {
        HardwareId::Mhz14a => &["mhz14a", "co2"],
        HardwareId::Dht22 => &["dht22", "dht", "temp", "humidity"],
        HardwareId::Sgp40 => &["sgp40", "sgp", "voc"],
        HardwareId::Sgp30 => &["sgp30", "eco2", "tvoc"],
        HardwareId::Sps30 => &["sps30", "pm"],
        HardwareId::Bmp280 => &["bmp280", "bmp", "pressure"],
        HardwareId::Sht40 => &["sht40", "sht", "temp_sht", "hum_sht"],
        HardwareId::Sc16co => &["sc16co", "co"],
    }
}

/// Whether a reset command naming `target` selects `hw`.
///
/// The membership test runs once per unit, so a target that aliases a
/// unit through several names still re-initializes it exactly once.
pub fn reset_matches(hw: HardwareId, target: &str) -> bool {
    target == "all" || reset_targets(hw).contains(&target)
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Outcome of scanning one cascade against a `sensors` payload object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// No key of the cascade appears in the payload.
    Absent,
    /// `key` is present but its interval is missing, not an unsigned
    /// integer, or below the floor. The cascade stopped here anyway.
    Rejected { key: &'static str },
    /// `key` is present with a valid interval (whole seconds).
    Accepted { key: &'static str, secs: u64 },
}

/// Scan a cascade against the payload's `sensors` object.
///
/// Presence is decided per key on the object itself; the interval value is
/// only inspected for the first present key. `{"interval": 4}` and
/// `{"interval": "fast"}` both terminate the cascade as [`Resolution::Rejected`].
pub fn resolve(sensors: &Map<String, Value>, keys: &[&'static str]) -> Resolution {
    for &key in keys {
        if let Some(entry) = sensors.get(key) {
            return match interval_secs(entry) {
                Some(secs) => Resolution::Accepted { key, secs },
                None => Resolution::Rejected { key },
            };
        }
    }
    Resolution::Absent
}

/// Extract a valid interval from one matched entry: an object with an
/// unsigned-integer `interval` member at or above [`MIN_INTERVAL_SECS`].
fn interval_secs(entry: &Value) -> Option<u64> {
    entry
        .get("interval")
        .and_then(Value::as_u64)
        .filter(|&secs| secs >= MIN_INTERVAL_SECS)
}
