//! Provisioning request assembly
//!
//! Pure string assembly of the values a DPS connection needs, derived
//! from one validated [`DeviceConfig`]. No protocol handling lives
//! here; the consuming firmware owns transport, TLS and retries.

use core::fmt::Write;

use heapless::String;

use crate::config::{
    DeviceConfig, MAX_ENDPOINT_LEN, MAX_ID_SCOPE_LEN, MAX_REGISTRATION_ID_LEN, MAX_TOKEN_LEN,
};
use crate::validate::{validate_config, ValidationError};

/// API version DPS expects in the connection username
pub const DPS_API_VERSION: &str = "2019-03-31";

/// TLS MQTT port the provisioning service listens on
pub const SERVICE_PORT: u16 = 8883;

/// Maximum registration resource URI
pub const MAX_RESOURCE_URI_LEN: usize =
    MAX_ID_SCOPE_LEN + "/registrations/".len() + MAX_REGISTRATION_ID_LEN;

/// Maximum connection username
pub const MAX_USERNAME_LEN: usize =
    MAX_RESOURCE_URI_LEN + "/api-version=".len() + DPS_API_VERSION.len();

/// Reasons a request cannot be assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestError {
    /// Configuration failed validation
    Invalid(ValidationError),
    /// An assembled value exceeds its capacity
    TooLong,
}

impl From<ValidationError> for RequestError {
    fn from(err: ValidationError) -> Self {
        Self::Invalid(err)
    }
}

/// The resource a registration token is scoped to
pub fn registration_uri(
    id_scope: &str,
    registration_id: &str,
) -> Result<String<MAX_RESOURCE_URI_LEN>, RequestError> {
    let mut uri = String::new();
    write!(uri, "{}/registrations/{}", id_scope, registration_id)
        .map_err(|_| RequestError::TooLong)?;
    Ok(uri)
}

/// Everything a DPS connection needs, assembled from one configuration
///
/// `password` is the SAS token text, passed through unchanged. A value
/// of this type only exists for a configuration that passed
/// [`validate_config`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegistrationRequest {
    /// Broker hostname to connect to
    pub host: String<MAX_ENDPOINT_LEN>,
    /// TLS MQTT port
    pub port: u16,
    /// Client identifier, the registration ID
    pub client_id: String<MAX_REGISTRATION_ID_LEN>,
    /// Username carrying scope, registration and API version
    pub username: String<MAX_USERNAME_LEN>,
    /// Password, the SAS token text
    pub password: String<MAX_TOKEN_LEN>,
    /// Resource the token is scoped to
    pub resource_uri: String<MAX_RESOURCE_URI_LEN>,
}

impl RegistrationRequest {
    /// Validate a configuration and assemble the request values
    pub fn from_config(config: &DeviceConfig) -> Result<Self, RequestError> {
        validate_config(config)?;

        let resource_uri =
            registration_uri(&config.dps.id_scope, &config.device.registration_id)?;
        let mut username: String<MAX_USERNAME_LEN> = String::new();
        write!(username, "{}/api-version={}", resource_uri, DPS_API_VERSION)
            .map_err(|_| RequestError::TooLong)?;

        Ok(Self {
            host: config.dps.endpoint.clone(),
            port: SERVICE_PORT,
            client_id: config.device.registration_id.clone(),
            username,
            password: config.device.sas_token.clone(),
            resource_uri,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeviceCredentials, DpsConfig, Field, WifiConfig};

    const TOKEN: &str = "SharedAccessSignature sr=0ne00A1B2C3%2Fregistrations%2Fdev-002&sig=oRr9bTY1Dg3mU%2FKpW8s4Vx2zQnE%3D&se=1767225600&skn=registration";

    fn example_config() -> DeviceConfig {
        let mut config = DeviceConfig::new();
        config.wifi = WifiConfig::new("MyWiFi", "pass123").unwrap();
        config.dps =
            DpsConfig::new("global.azure-devices-provisioning.net", "0ne00A1B2C3").unwrap();
        config.device = DeviceCredentials::new("dev-002", TOKEN).unwrap();
        config
    }

    #[test]
    fn test_registration_uri_layout() {
        let uri = registration_uri("0ne00A1B2C3", "dev-002").unwrap();
        assert_eq!(uri.as_str(), "0ne00A1B2C3/registrations/dev-002");
    }

    #[test]
    fn test_registration_uri_capacity() {
        let long = [b'a'; MAX_RESOURCE_URI_LEN];
        let long = core::str::from_utf8(&long).unwrap();
        assert_eq!(registration_uri("x", long), Err(RequestError::TooLong));
    }

    #[test]
    fn test_request_from_example_values() {
        let request = RegistrationRequest::from_config(&example_config()).unwrap();

        assert_eq!(request.host.as_str(), "global.azure-devices-provisioning.net");
        assert_eq!(request.port, 8883);
        assert_eq!(request.client_id.as_str(), "dev-002");
        assert_eq!(
            request.resource_uri.as_str(),
            "0ne00A1B2C3/registrations/dev-002"
        );
        assert_eq!(
            request.username.as_str(),
            "0ne00A1B2C3/registrations/dev-002/api-version=2019-03-31"
        );
        assert_eq!(request.password.as_str(), TOKEN);
    }

    #[test]
    fn test_rejects_unprovisioned_config() {
        let config = crate::config::defaults::embedded_default();
        assert_eq!(
            RegistrationRequest::from_config(&config),
            Err(RequestError::Invalid(ValidationError::Placeholder(
                Field::Ssid
            )))
        );
    }

    #[test]
    fn test_rejects_token_for_other_device() {
        let mut config = example_config();
        config.device.registration_id = heapless::String::try_from("dev-003").unwrap();
        assert_eq!(
            RegistrationRequest::from_config(&config),
            Err(RequestError::Invalid(ValidationError::ResourceMismatch))
        );
    }
}
