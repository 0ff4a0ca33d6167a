//! Hardware unit registry.
//!
//! Compile-time tables describing every sensor unit the node carries:
//!
//! ```text
//! ┌──────────┬──────────┬──────────────────────────────┐
//! │ unit     │ bus      │ channels                     │
//! ├──────────┼──────────┼──────────────────────────────┤
//! │ mhz14a   │ UART2    │ co2                          │
//! │ dht22    │ GPIO     │ temperature, humidity        │
//! │ sgp40    │ I2C(aux) │ voc                          │
//! │ sgp30    │ I2C      │ eco2, tvoc                   │
//! │ sps30    │ UART1    │ pm1, pm25, pm4, pm10         │
//! │ bmp280   │ I2C      │ pressure, temperature        │
//! │ sht40    │ I2C      │ temperature, humidity        │
//! │ sc16co   │ UART0    │ co                           │
//! └──────────┴──────────┴──────────────────────────────┘
//! ```
//!
//! The enum is closed: anything arriving from the outside world (command
//! payloads, persisted keys) passes through [`HardwareId::from_id`] and
//! unknown names surface as `None` at that single choke point.

// ---------------------------------------------------------------------------
// Hardware identity
// ---------------------------------------------------------------------------

/// Enumeration of all sensor hardware units on the board.
/// Must stay in sync with the channel table in [`HardwareId::channels`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HardwareId {
    Mhz14a = 0,
    Dht22 = 1,
    Sgp40 = 2,
    Sgp30 = 3,
    Sps30 = 4,
    Bmp280 = 5,
    Sht40 = 6,
    Sc16co = 7,
}

/// Total number of hardware units — sizes every per-unit array.
pub const HW_COUNT: usize = 8;

impl HardwareId {
    /// All units in index order. Iteration order is the scheduling order.
    pub const ALL: [Self; HW_COUNT] = [
        Self::Mhz14a,
        Self::Dht22,
        Self::Sgp40,
        Self::Sgp30,
        Self::Sps30,
        Self::Bmp280,
        Self::Sht40,
        Self::Sc16co,
    ];

    /// Array index for per-unit state (`self as usize`, kept explicit so
    /// callers never cast).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical id string: topic segment, persistence key, command target.
    pub fn id(self) -> &'static str {
        match self {
            Self::Mhz14a => "mhz14a",
            Self::Dht22 => "dht22",
            Self::Sgp40 => "sgp40",
            Self::Sgp30 => "sgp30",
            Self::Sps30 => "sps30",
            Self::Bmp280 => "bmp280",
            Self::Sht40 => "sht40",
            Self::Sc16co => "sc16co",
        }
    }

    /// Human-readable label for log lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Mhz14a => "MH-Z14A CO2",
            Self::Dht22 => "DHT22 temp/humidity",
            Self::Sgp40 => "SGP40 VOC",
            Self::Sgp30 => "SGP30 eCO2/TVOC",
            Self::Sps30 => "SPS30 particulate",
            Self::Bmp280 => "BMP280 pressure",
            Self::Sht40 => "SHT40 temp/humidity",
            Self::Sc16co => "SC16 CO",
        }
    }

    /// The measurement channels this unit publishes, in publish order.
    pub fn channels(self) -> &'static [Channel] {
        match self {
            Self::Mhz14a => &[Channel::Co2],
            Self::Dht22 => &[Channel::Temperature, Channel::Humidity],
            Self::Sgp40 => &[Channel::Voc],
            Self::Sgp30 => &[Channel::Eco2, Channel::Tvoc],
            Self::Sps30 => &[Channel::Pm1, Channel::Pm25, Channel::Pm4, Channel::Pm10],
            Self::Bmp280 => &[Channel::Pressure, Channel::Temperature],
            Self::Sht40 => &[Channel::Temperature, Channel::Humidity],
            Self::Sc16co => &[Channel::Co],
        }
    }

    /// Resolve a canonical id string back to a unit.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|hw| hw.id() == id)
    }
}

// ---------------------------------------------------------------------------
// Measurement channels
// ---------------------------------------------------------------------------

/// Measurement channel names. Several units share a name (`temperature`
/// appears on dht22, bmp280 and sht40); the publish topic disambiguates by
/// carrying the unit id segment ahead of the channel segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Channel {
    Co2 = 0,
    Temperature = 1,
    Humidity = 2,
    Voc = 3,
    Eco2 = 4,
    Tvoc = 5,
    Pm1 = 6,
    Pm25 = 7,
    Pm4 = 8,
    Pm10 = 9,
    Pressure = 10,
    Co = 11,
}

impl Channel {
    /// Topic segment for this channel.
    pub fn name(self) -> &'static str {
        match self {
            Self::Co2 => "co2",
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Voc => "voc",
            Self::Eco2 => "eco2",
            Self::Tvoc => "tvoc",
            Self::Pm1 => "pm1",
            Self::Pm25 => "pm25",
            Self::Pm4 => "pm4",
            Self::Pm10 => "pm10",
            Self::Pressure => "pressure",
            Self::Co => "co",
        }
    }
}
