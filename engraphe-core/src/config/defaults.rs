//! Embedded default configuration
//!
//! The values every device image ships with before an operator fills in
//! real credentials. `***` marks a field that must be replaced; the
//! endpoint default is the public provisioning endpoint and usually
//! stays as shipped.

use heapless::String;

use super::types::{
    DeviceConfig, DeviceCredentials, DpsConfig, WifiConfig, CONFIG_VERSION, MAX_ENDPOINT_LEN,
};

/// Marker for values the operator must replace
pub const PLACEHOLDER: &str = "***";

/// Public provisioning endpoint, correct unless a private instance is used
pub const DEFAULT_ENDPOINT: &str = "global.azure-devices-provisioning.net";

/// Placeholder Wi-Fi SSID
pub const PLACEHOLDER_SSID: &str = "***";

/// Placeholder Wi-Fi passphrase
pub const PLACEHOLDER_PASSPHRASE: &str = "***";

/// Placeholder ID scope (the DPS portal shows the real one)
pub const PLACEHOLDER_ID_SCOPE: &str = "***";

/// Placeholder registration ID, replaced per device
pub const PLACEHOLDER_REGISTRATION_ID: &str = "dev-001";

/// Placeholder SAS token, replaced with one minted by the operator tooling
///
/// Carries every parameter the grammar names so that shape checks pass
/// before the real credentials arrive.
pub const PLACEHOLDER_SAS_TOKEN: &str =
    "SharedAccessSignature sr=***&sig=***&se=0&skn=registration";

/// The default provisioning endpoint as a bounded string
pub fn endpoint() -> String<MAX_ENDPOINT_LEN> {
    lit(DEFAULT_ENDPOINT)
}

/// The configuration compiled into every image before provisioning
///
/// Fallback target for `ConfigStore::load_or_default`. Carries
/// placeholder credentials that fail validation until replaced.
pub fn embedded_default() -> DeviceConfig {
    DeviceConfig {
        version: CONFIG_VERSION,
        wifi: WifiConfig {
            ssid: lit(PLACEHOLDER_SSID),
            passphrase: lit(PLACEHOLDER_PASSPHRASE),
        },
        dps: DpsConfig {
            endpoint: endpoint(),
            id_scope: lit(PLACEHOLDER_ID_SCOPE),
        },
        device: DeviceCredentials {
            registration_id: lit(PLACEHOLDER_REGISTRATION_ID),
            sas_token: lit(PLACEHOLDER_SAS_TOKEN),
        },
    }
}

fn lit<const N: usize>(value: &str) -> String<N> {
    String::try_from(value).expect("default literal fits its field")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fit_their_fields() {
        // Exercises every `lit` call; a panic here means a default
        // literal outgrew its field capacity.
        let config = embedded_default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.dps.endpoint.as_str(), DEFAULT_ENDPOINT);
        assert_eq!(config.device.registration_id.as_str(), "dev-001");
    }

    #[test]
    fn test_placeholders_carry_the_marker() {
        let config = embedded_default();
        assert!(config.wifi.ssid.contains(PLACEHOLDER));
        assert!(config.wifi.passphrase.contains(PLACEHOLDER));
        assert!(config.dps.id_scope.contains(PLACEHOLDER));
        assert!(config.device.sas_token.contains(PLACEHOLDER));
        // The registration ID placeholder is a syntactically valid ID
        assert!(!config.device.registration_id.contains(PLACEHOLDER));
    }
}
