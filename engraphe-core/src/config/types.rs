//! Configuration type definitions
//!
//! These types carry the six provisioning values a device consumes at
//! initialization: Wi-Fi credentials, the provisioning endpoint, the ID
//! scope, and the per-device registration ID and SAS token. Configuration
//! is stored in flash as postcard-serialized binary data or as TOML
//! manifest text.

use heapless::String;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Configuration format version for compatibility checks
pub const CONFIG_VERSION: u8 = 1;

/// Maximum Wi-Fi SSID length (IEEE 802.11 limit)
pub const MAX_SSID_LEN: usize = 32;

/// Maximum Wi-Fi passphrase length (WPA2 limit)
pub const MAX_PASSPHRASE_LEN: usize = 64;

/// Maximum provisioning endpoint hostname length
pub const MAX_ENDPOINT_LEN: usize = 96;

/// Maximum ID scope length
pub const MAX_ID_SCOPE_LEN: usize = 16;

/// Maximum registration ID length (DPS limit)
pub const MAX_REGISTRATION_ID_LEN: usize = 128;

/// Maximum SAS token text length
pub const MAX_TOKEN_LEN: usize = 512;

/// Configuration fields, used in error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    Ssid,
    Passphrase,
    Endpoint,
    IdScope,
    RegistrationId,
    SasToken,
}

/// Errors from building configuration values out of raw text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldError {
    /// Value exceeds the field capacity
    TooLong(Field),
}

/// Wi-Fi access credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WifiConfig {
    /// Network SSID
    pub ssid: String<MAX_SSID_LEN>,
    /// Network passphrase
    pub passphrase: String<MAX_PASSPHRASE_LEN>,
}

impl WifiConfig {
    /// Build Wi-Fi credentials from raw text
    pub fn new(ssid: &str, passphrase: &str) -> Result<Self, FieldError> {
        Ok(Self {
            ssid: String::try_from(ssid).map_err(|_| FieldError::TooLong(Field::Ssid))?,
            passphrase: String::try_from(passphrase)
                .map_err(|_| FieldError::TooLong(Field::Passphrase))?,
        })
    }
}

/// Provisioning service coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DpsConfig {
    /// Provisioning broker hostname
    pub endpoint: String<MAX_ENDPOINT_LEN>,
    /// ID scope assigned by the DPS operator
    pub id_scope: String<MAX_ID_SCOPE_LEN>,
}

impl Default for DpsConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::endpoint(),
            id_scope: String::new(),
        }
    }
}

impl DpsConfig {
    /// Build provisioning coordinates from raw text
    pub fn new(endpoint: &str, id_scope: &str) -> Result<Self, FieldError> {
        Ok(Self {
            endpoint: String::try_from(endpoint).map_err(|_| FieldError::TooLong(Field::Endpoint))?,
            id_scope: String::try_from(id_scope).map_err(|_| FieldError::TooLong(Field::IdScope))?,
        })
    }
}

/// Per-device enrollment credentials
///
/// The group key itself never reaches the device; each device carries
/// only its own registration ID and the token derived for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceCredentials {
    /// Registration ID, unique within the enrollment group
    pub registration_id: String<MAX_REGISTRATION_ID_LEN>,
    /// SAS token minted for this device
    pub sas_token: String<MAX_TOKEN_LEN>,
}

impl DeviceCredentials {
    /// Build device credentials from raw text
    pub fn new(registration_id: &str, sas_token: &str) -> Result<Self, FieldError> {
        Ok(Self {
            registration_id: String::try_from(registration_id)
                .map_err(|_| FieldError::TooLong(Field::RegistrationId))?,
            sas_token: String::try_from(sas_token)
                .map_err(|_| FieldError::TooLong(Field::SasToken))?,
        })
    }
}

/// Complete device provisioning configuration
///
/// This is the top-level structure holding all six values consumed at
/// device initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
    /// Configuration version for compatibility checks
    pub version: u8,
    /// Wi-Fi access credentials
    pub wifi: WifiConfig,
    /// Provisioning service coordinates
    pub dps: DpsConfig,
    /// Per-device enrollment credentials
    pub device: DeviceCredentials,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            wifi: WifiConfig::default(),
            dps: DpsConfig::default(),
            device: DeviceCredentials::default(),
        }
    }
}

impl DeviceConfig {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config() {
        let config = DeviceConfig::new();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.wifi.ssid.is_empty());
        assert!(config.device.registration_id.is_empty());
        // The endpoint is the one value with a usable default
        assert_eq!(config.dps.endpoint.as_str(), defaults::DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_field_constructors() {
        let wifi = WifiConfig::new("MyWiFi", "pass123").unwrap();
        assert_eq!(wifi.ssid.as_str(), "MyWiFi");
        assert_eq!(wifi.passphrase.as_str(), "pass123");

        let too_long = "123456789012345678901234567890123"; // 33 bytes
        assert_eq!(
            WifiConfig::new(too_long, "x"),
            Err(FieldError::TooLong(Field::Ssid))
        );

        let dps = DpsConfig::new("example.net", "0ne00A1B2C3").unwrap();
        assert_eq!(dps.id_scope.as_str(), "0ne00A1B2C3");
    }
}
