//! GPIO / peripheral pin assignments for the AirNode main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.
//!
//! The I²C/UART bus drivers are built in `main()` from concrete pin
//! singletons, so those numbers also appear there; keep the two in sync
//! when rewiring.

// ---------------------------------------------------------------------------
// I²C — main bus (BMP280, SGP30, SHT40)
// ---------------------------------------------------------------------------

pub const I2C_MAIN_SDA_GPIO: i32 = 21;
pub const I2C_MAIN_SCL_GPIO: i32 = 22;

// ---------------------------------------------------------------------------
// I²C — auxiliary bus (SGP40)
// ---------------------------------------------------------------------------

/// The SGP40 gets a dedicated bus so its long clock-stretches cannot
/// stall the SHT40/BMP280 transactions on the main bus.
pub const I2C_AUX_SDA_GPIO: i32 = 32;
pub const I2C_AUX_SCL_GPIO: i32 = 33;

// ---------------------------------------------------------------------------
// UART — MH-Z14A CO₂ sensor (UART2, 9600 8N1)
// ---------------------------------------------------------------------------

/// Sensor TX → our RX.
pub const CO2_UART_RX_GPIO: i32 = 25;
/// Our TX → sensor RX.
pub const CO2_UART_TX_GPIO: i32 = 26;

// ---------------------------------------------------------------------------
// UART — SPS30 particulate sensor (UART1, 115200 8N1, SHDLC framing)
// ---------------------------------------------------------------------------

pub const PM_UART_RX_GPIO: i32 = 13;
pub const PM_UART_TX_GPIO: i32 = 27;

// ---------------------------------------------------------------------------
// Bit-banged serial — SC16 CO sensor (9600 8N1)
// ---------------------------------------------------------------------------

/// All three hardware UARTs are spoken for (console, SPS30, MH-Z14A),
/// so the CO sensor runs on a software UART driven from the main task.
/// Sensor TX → our RX.
pub const CO_RX_GPIO: i32 = 14;
/// Our TX → sensor RX.
pub const CO_TX_GPIO: i32 = 12;

// ---------------------------------------------------------------------------
// DHT22 temperature/humidity — single-wire, external 10 kΩ pull-up
// ---------------------------------------------------------------------------

pub const DHT_GPIO: i32 = 4;
