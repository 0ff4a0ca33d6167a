//! NVS (Non-Volatile Storage) adapter for the enabled-flag map.
//!
//! Implements [`EnableStorePort`].  One `u8` entry per hardware unit in
//! the `sensor_en` namespace, keyed by the unit's canonical id.  An
//! absent entry reads as enabled — a fresh board polls everything.
//!
//! On ESP32 every entry write commits atomically; [`save_all`] writes
//! the full map under one handle and one commit.  The host backend is a
//! `RefCell<HashMap>` with the same observable behavior.
//!
//! [`save_all`]: EnableStorePort::save_all

use crate::app::ports::{EnableStorePort, StorageError};
use crate::registry::{HW_COUNT, HardwareId};
use log::{info, warn};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const ENABLE_NAMESPACE: &str = "sensor_en";

pub struct NvsEnableStore {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, u8>>,
}

impl NvsEnableStore {
    /// Create the store and initialise NVS flash.
    ///
    /// On first boot or after an NVS layout version bump the partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase run from the single
            // main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(StorageError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(StorageError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(StorageError::IoError);
            }
            info!("NvsEnableStore: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsEnableStore: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    /// Open the enable namespace, execute a closure with the handle, close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut ns_buf = [0u8; 16];
        let ns_bytes = ENABLE_NAMESPACE.as_bytes();
        let len = ns_bytes.len().min(15);
        ns_buf[..len].copy_from_slice(&ns_bytes[..len]);

        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    /// NVS keys are NUL-terminated and at most 15 characters; unit ids
    /// fit with room to spare.
    #[cfg(target_os = "espidf")]
    fn key_buf(hw: HardwareId) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let kb = hw.id().as_bytes();
        let kl = kb.len().min(15);
        buf[..kl].copy_from_slice(&kb[..kl]);
        buf
    }
}

/// Degraded-mode store for when flash init fails at boot: every flag
/// reads as the enabled default and writes report [`StorageError`].
impl Default for NvsEnableStore {
    fn default() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        }
    }
}

impl EnableStorePort for NvsEnableStore {
    fn load(&self, hw: HardwareId) -> bool {
        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .borrow()
                .get(hw.id())
                .map_or(true, |&v| v != 0)
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(false, |handle| {
                let key = Self::key_buf(hw);
                let mut val: u8 = 1;
                let ret = unsafe { nvs_get_u8(handle, key.as_ptr() as *const _, &mut val) };
                if ret == ESP_ERR_NVS_NOT_FOUND {
                    return Err(ESP_ERR_NVS_NOT_FOUND);
                }
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(val != 0)
            });
            match result {
                Ok(enabled) => enabled,
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => true,
                Err(e) => {
                    // Unreadable entry degrades to the enabled default.
                    warn!("NvsEnableStore: read error {} for {}", e, hw.id());
                    true
                }
            }
        }
    }

    fn save_all(&mut self, flags: &[(HardwareId, bool); HW_COUNT]) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let mut store = self.store.borrow_mut();
            for (hw, enabled) in flags {
                store.insert(hw.id().to_string(), u8::from(*enabled));
            }
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(true, |handle| {
                for (hw, enabled) in flags {
                    let key = Self::key_buf(*hw);
                    let ret = unsafe {
                        nvs_set_u8(handle, key.as_ptr() as *const _, u8::from(*enabled))
                    };
                    if ret != ESP_OK {
                        return Err(ret);
                    }
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => Ok(()),
                Err(e) if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE => Err(StorageError::Full),
                Err(e) => {
                    warn!("NvsEnableStore: NVS write error {}", e);
                    Err(StorageError::IoError)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SensorConfig;

    #[test]
    fn fresh_store_reads_all_enabled() {
        let store = NvsEnableStore::new().unwrap();
        for hw in HardwareId::ALL {
            assert!(store.load(hw), "{} should default to enabled", hw.id());
        }
    }

    #[test]
    fn save_all_round_trips() {
        let mut store = NvsEnableStore::new().unwrap();
        let mut config = SensorConfig::default();
        config.set_enabled(HardwareId::Sgp30, false);
        config.set_enabled(HardwareId::Sc16co, false);

        store.save_all(&config.enabled_snapshot()).unwrap();

        assert!(!store.load(HardwareId::Sgp30));
        assert!(!store.load(HardwareId::Sc16co));
        assert!(store.load(HardwareId::Mhz14a));
        assert!(store.load(HardwareId::Bmp280));
    }

    #[test]
    fn later_save_overwrites_earlier() {
        let mut store = NvsEnableStore::new().unwrap();
        let mut config = SensorConfig::default();

        config.set_enabled(HardwareId::Dht22, false);
        store.save_all(&config.enabled_snapshot()).unwrap();
        assert!(!store.load(HardwareId::Dht22));

        config.set_enabled(HardwareId::Dht22, true);
        store.save_all(&config.enabled_snapshot()).unwrap();
        assert!(store.load(HardwareId::Dht22));
    }

    #[test]
    fn save_is_total_not_incremental() {
        let mut store = NvsEnableStore::new().unwrap();
        let mut config = SensorConfig::default();
        config.set_enabled(HardwareId::Sps30, false);
        store.save_all(&config.enabled_snapshot()).unwrap();

        // Every unit has an entry after one save, not just the changed one.
        let inner = store.store.borrow();
        assert_eq!(inner.len(), HW_COUNT);
    }
}
