//! WiFi station-mode adapter.
//!
//! Brings the station interface up once at boot and hands the live handle
//! back to `main`, which keeps it alive for the process lifetime.  Link
//! recovery after that point belongs to the ESP-IDF WiFi driver; the
//! main loop never blocks on connectivity.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real blocking STA bring-up via
//!   `esp_idf_svc::wifi`.
//! - **all other targets**: validation-only stub for host-side tests.

use core::fmt;
use log::info;

// ───────────────────────────────────────────────────────────────
// Build-time credentials
// ───────────────────────────────────────────────────────────────

/// SSID baked in at build time; per-site override via environment.
pub const WIFI_SSID: &str = match option_env!("AIRNODE_WIFI_SSID") {
    Some(ssid) => ssid,
    None => "airnode-lab",
};

/// WPA2 passphrase; empty selects an open network.
pub const WIFI_PASSWORD: &str = match option_env!("AIRNODE_WIFI_PASSWORD") {
    Some(pw) => pw,
    None => "",
};

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    InvalidSsid,
    InvalidPassword,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
        }
    }
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Settings
// ───────────────────────────────────────────────────────────────

/// Validated station credentials.
#[derive(Debug)]
pub struct WifiSettings {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
}

impl WifiSettings {
    pub fn new(ssid: &str, password: &str) -> Result<Self, ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        let mut s = Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
        };
        s.ssid
            .push_str(ssid)
            .map_err(|()| ConnectivityError::InvalidSsid)?;
        s.password
            .push_str(password)
            .map_err(|()| ConnectivityError::InvalidPassword)?;
        Ok(s)
    }

    /// Credentials baked in by the build environment.
    pub fn from_build_env() -> Result<Self, ConnectivityError> {
        Self::new(WIFI_SSID, WIFI_PASSWORD)
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }
}

// ───────────────────────────────────────────────────────────────
// Station bring-up
// ───────────────────────────────────────────────────────────────

/// Blocking STA connect.  Returns the live handle; dropping it tears the
/// interface down, so the caller owns it for the process lifetime.
#[cfg(target_os = "espidf")]
pub fn connect_station(
    modem: esp_idf_hal::modem::Modem,
    sysloop: esp_idf_svc::eventloop::EspSystemEventLoop,
    nvs: esp_idf_svc::nvs::EspDefaultNvsPartition,
    settings: &WifiSettings,
) -> anyhow::Result<esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>> {
    use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

    let mut wifi = BlockingWifi::wrap(EspWifi::new(modem, sysloop.clone(), Some(nvs))?, sysloop)?;

    let auth_method = if settings.password.is_empty() {
        AuthMethod::None
    } else {
        AuthMethod::WPA2Personal
    };
    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: settings
            .ssid
            .as_str()
            .try_into()
            .map_err(|()| anyhow::anyhow!("SSID exceeds 32 bytes"))?,
        password: settings
            .password
            .as_str()
            .try_into()
            .map_err(|()| anyhow::anyhow!("password exceeds 64 bytes"))?,
        auth_method,
        ..Default::default()
    }))?;

    info!("WiFi: connecting to '{}'", settings.ssid());
    wifi.start()?;
    wifi.connect()?;
    wifi.wait_netif_up()?;
    info!("WiFi: connected, netif up");
    Ok(wifi)
}

/// Host build: validation already happened in [`WifiSettings`]; just log.
#[cfg(not(target_os = "espidf"))]
pub fn connect_station(settings: &WifiSettings) -> anyhow::Result<()> {
    info!("WiFi(sim): station '{}' assumed up", settings.ssid());
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_ssid() {
        assert_eq!(
            WifiSettings::new("", "password123").unwrap_err(),
            ConnectivityError::InvalidSsid
        );
    }

    #[test]
    fn rejects_oversized_ssid() {
        let long = "x".repeat(33);
        assert_eq!(
            WifiSettings::new(&long, "").unwrap_err(),
            ConnectivityError::InvalidSsid
        );
    }

    #[test]
    fn rejects_non_printable_ssid() {
        assert_eq!(
            WifiSettings::new("net\u{7}work", "").unwrap_err(),
            ConnectivityError::InvalidSsid
        );
    }

    #[test]
    fn rejects_short_password() {
        assert_eq!(
            WifiSettings::new("MyNet", "short").unwrap_err(),
            ConnectivityError::InvalidPassword
        );
    }

    #[test]
    fn accepts_open_network() {
        assert!(WifiSettings::new("OpenCafe", "").is_ok());
    }

    #[test]
    fn accepts_valid_wpa2() {
        let s = WifiSettings::new("HomeWiFi", "mysecret8").unwrap();
        assert_eq!(s.ssid(), "HomeWiFi");
    }
}
