//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements      | Connects to                    |
//! |------------|-----------------|--------------------------------|
//! | `hardware` | DriverPort      | SensorBus (I²C/UART/GPIO)      |
//! | `mqtt`     | PublishPort     | ESP-IDF MQTT client            |
//! | `nvs`      | EnableStorePort | NVS / in-memory store          |
//! | `log_sink` | EventSink       | Serial log output              |
//! | `time`     | —               | ESP32 system timer             |
//! | `wifi`     | —               | ESP-IDF WiFi STA               |

pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod nvs;
pub mod time;
pub mod wifi;
