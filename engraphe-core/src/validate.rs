//! Configuration validation
//!
//! Static checks on a [`DeviceConfig`] before the firmware tries to use
//! it. Placeholder values are reported before structural errors, so an
//! unprovisioned device produces an actionable log line instead of a
//! grammar error about `***`.

use engraphe_token::{SasToken, TokenError, REGISTRATION_KEY_NAME};

use crate::config::{
    defaults, DeviceConfig, DeviceCredentials, DpsConfig, Field, WifiConfig,
    MAX_REGISTRATION_ID_LEN,
};
use crate::request;

/// Reasons a configuration is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValidationError {
    /// Field still carries the shipped placeholder
    Placeholder(Field),
    /// Required field is empty
    Empty(Field),
    /// Endpoint is not a valid hostname
    InvalidHostname,
    /// ID scope must be ASCII alphanumeric
    InvalidIdScope,
    /// Registration ID violates the service character rules
    InvalidRegistrationId,
    /// SAS token text does not parse
    Token(TokenError),
    /// Token key name is not the enrollment group policy
    WrongKeyName,
    /// Token resource does not cover this device's registration
    ResourceMismatch,
}

impl From<TokenError> for ValidationError {
    fn from(err: TokenError) -> Self {
        Self::Token(err)
    }
}

/// Validate a full configuration, field group by field group
pub fn validate_config(config: &DeviceConfig) -> Result<(), ValidationError> {
    validate_wifi(&config.wifi)?;
    validate_dps(&config.dps)?;
    validate_credentials(&config.dps, &config.device)?;
    Ok(())
}

/// Validate the Wi-Fi station settings
pub fn validate_wifi(wifi: &WifiConfig) -> Result<(), ValidationError> {
    check_placeholder(&wifi.ssid, Field::Ssid)?;
    check_placeholder(&wifi.passphrase, Field::Passphrase)?;
    if wifi.ssid.is_empty() {
        return Err(ValidationError::Empty(Field::Ssid));
    }
    if wifi.passphrase.is_empty() {
        return Err(ValidationError::Empty(Field::Passphrase));
    }
    Ok(())
}

/// Validate the provisioning service settings
pub fn validate_dps(dps: &DpsConfig) -> Result<(), ValidationError> {
    check_placeholder(&dps.endpoint, Field::Endpoint)?;
    check_placeholder(&dps.id_scope, Field::IdScope)?;
    if dps.endpoint.is_empty() {
        return Err(ValidationError::Empty(Field::Endpoint));
    }
    if !valid_hostname(&dps.endpoint) {
        return Err(ValidationError::InvalidHostname);
    }
    if dps.id_scope.is_empty() {
        return Err(ValidationError::Empty(Field::IdScope));
    }
    if !dps.id_scope.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidIdScope);
    }
    Ok(())
}

/// Validate a registration ID against the service rules
///
/// Lowercase alphanumeric plus `-`, `.`, `_` and `:`; the last
/// character must be alphanumeric or `-`.
pub fn validate_registration_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::Empty(Field::RegistrationId));
    }
    if id.len() > MAX_REGISTRATION_ID_LEN {
        return Err(ValidationError::InvalidRegistrationId);
    }
    let charset_ok = id.bytes().all(|b| {
        b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'-' | b'.' | b'_' | b':')
    });
    if !charset_ok {
        return Err(ValidationError::InvalidRegistrationId);
    }
    match id.as_bytes().last() {
        Some(&last) if last.is_ascii_lowercase() || last.is_ascii_digit() || last == b'-' => Ok(()),
        _ => Err(ValidationError::InvalidRegistrationId),
    }
}

/// Validate the per-device credentials against the service settings
///
/// The SAS token must parse, carry the `registration` policy name, and
/// grant access to exactly this device's registration resource.
pub fn validate_credentials(
    dps: &DpsConfig,
    device: &DeviceCredentials,
) -> Result<(), ValidationError> {
    check_placeholder(&device.registration_id, Field::RegistrationId)?;
    check_placeholder(&device.sas_token, Field::SasToken)?;
    if device.sas_token.is_empty() {
        return Err(ValidationError::Empty(Field::SasToken));
    }
    validate_registration_id(&device.registration_id)?;

    let token = SasToken::parse(&device.sas_token)?;
    if token.key_name() != Some(REGISTRATION_KEY_NAME) {
        return Err(ValidationError::WrongKeyName);
    }
    // A resource too long to express cannot match either
    let expected = request::registration_uri(&dps.id_scope, &device.registration_id)
        .map_err(|_| ValidationError::ResourceMismatch)?;
    if !token.resource_matches(&expected) {
        return Err(ValidationError::ResourceMismatch);
    }
    Ok(())
}

fn check_placeholder(value: &str, field: Field) -> Result<(), ValidationError> {
    // `contains` rather than equality so a half-edited value such as
    // `sr=***` inside a token is still caught
    if value.contains(defaults::PLACEHOLDER) {
        return Err(ValidationError::Placeholder(field));
    }
    Ok(())
}

fn valid_hostname(host: &str) -> bool {
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
            && !label.starts_with('-')
            && !label.ends_with('-')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::String;
    use proptest::prelude::*;

    const TOKEN: &str = "SharedAccessSignature sr=0ne00A1B2C3%2Fregistrations%2Fdev-002&sig=oRr9bTY1Dg3mU%2FKpW8s4Vx2zQnE%3D&se=1767225600&skn=registration";

    fn provisioned_config() -> DeviceConfig {
        let mut config = defaults::embedded_default();
        config.wifi = WifiConfig::new("shopfloor-iot", "correct horse battery").unwrap();
        config.dps.id_scope = String::try_from("0ne00A1B2C3").unwrap();
        config.device = DeviceCredentials::new("dev-002", TOKEN).unwrap();
        config
    }

    #[test]
    fn test_provisioned_config_passes() {
        assert_eq!(validate_config(&provisioned_config()), Ok(()));
    }

    #[test]
    fn test_embedded_default_reports_placeholder() {
        let config = defaults::embedded_default();
        assert_eq!(
            validate_config(&config),
            Err(ValidationError::Placeholder(Field::Ssid))
        );
    }

    #[test]
    fn test_wifi_rules() {
        let unnamed = WifiConfig::new("", "secret").unwrap();
        assert_eq!(
            validate_wifi(&unnamed),
            Err(ValidationError::Empty(Field::Ssid))
        );

        let open = WifiConfig::new("guest", "").unwrap();
        assert_eq!(
            validate_wifi(&open),
            Err(ValidationError::Empty(Field::Passphrase))
        );

        let half_filled = WifiConfig::new("guest", "***").unwrap();
        assert_eq!(
            validate_wifi(&half_filled),
            Err(ValidationError::Placeholder(Field::Passphrase))
        );
    }

    #[test]
    fn test_hostname_rules() {
        assert!(valid_hostname("global.azure-devices-provisioning.net"));
        assert!(valid_hostname("host"));
        assert!(valid_hostname("h-1.example"));
        assert!(valid_hostname("10.0.0.2"));

        assert!(!valid_hostname(""));
        assert!(!valid_hostname("-bad.example"));
        assert!(!valid_hostname("bad-.example"));
        assert!(!valid_hostname("a..b"));
        assert!(!valid_hostname(".a"));
        assert!(!valid_hostname("a."));
        assert!(!valid_hostname("under_score.example"));
        assert!(!valid_hostname("spa ce.example"));

        let long_label = [b'a'; 64];
        let long_label = core::str::from_utf8(&long_label).unwrap();
        assert!(!valid_hostname(long_label));
    }

    #[test]
    fn test_dps_rules() {
        let good = DpsConfig::new("global.azure-devices-provisioning.net", "0ne00A1B2C3").unwrap();
        assert_eq!(validate_dps(&good), Ok(()));

        let spaced = DpsConfig::new("global.azure-devices-provisioning.net", "0ne 0").unwrap();
        assert_eq!(validate_dps(&spaced), Err(ValidationError::InvalidIdScope));

        let scopeless = DpsConfig::new("global.azure-devices-provisioning.net", "").unwrap();
        assert_eq!(
            validate_dps(&scopeless),
            Err(ValidationError::Empty(Field::IdScope))
        );

        let bad_host = DpsConfig::new("not a host", "0ne00A1B2C3").unwrap();
        assert_eq!(validate_dps(&bad_host), Err(ValidationError::InvalidHostname));
    }

    #[test]
    fn test_registration_id_rules() {
        assert_eq!(validate_registration_id("dev-002"), Ok(()));
        assert_eq!(validate_registration_id("a"), Ok(()));
        assert_eq!(validate_registration_id("x-"), Ok(()));
        assert_eq!(validate_registration_id("rack_4:unit.7"), Ok(()));

        assert_eq!(
            validate_registration_id(""),
            Err(ValidationError::Empty(Field::RegistrationId))
        );
        for bad in ["Dev-002", "dev 002", "dev:", "dev.", "dev_", "d\u{e9}v"] {
            assert_eq!(
                validate_registration_id(bad),
                Err(ValidationError::InvalidRegistrationId),
                "{bad:?} should be rejected"
            );
        }

        let too_long = [b'a'; MAX_REGISTRATION_ID_LEN + 1];
        let too_long = core::str::from_utf8(&too_long).unwrap();
        assert_eq!(
            validate_registration_id(too_long),
            Err(ValidationError::InvalidRegistrationId)
        );
    }

    #[test]
    fn test_credentials_require_registration_policy() {
        let config = provisioned_config();

        let unsigned = DeviceCredentials::new(
            "dev-002",
            "SharedAccessSignature sr=0ne00A1B2C3%2Fregistrations%2Fdev-002&sig=x&se=1767225600",
        )
        .unwrap();
        assert_eq!(
            validate_credentials(&config.dps, &unsigned),
            Err(ValidationError::WrongKeyName)
        );

        let wrong_policy = DeviceCredentials::new(
            "dev-002",
            "SharedAccessSignature sr=0ne00A1B2C3%2Fregistrations%2Fdev-002&sig=x&se=1767225600&skn=device",
        )
        .unwrap();
        assert_eq!(
            validate_credentials(&config.dps, &wrong_policy),
            Err(ValidationError::WrongKeyName)
        );
    }

    #[test]
    fn test_credentials_resource_must_match_device() {
        let config = provisioned_config();

        // Token minted for a different device
        let borrowed = DeviceCredentials::new(
            "dev-003",
            "SharedAccessSignature sr=0ne00A1B2C3%2Fregistrations%2Fdev-002&sig=x&se=1767225600&skn=registration",
        )
        .unwrap();
        assert_eq!(
            validate_credentials(&config.dps, &borrowed),
            Err(ValidationError::ResourceMismatch)
        );

        // Token minted under a different scope
        let mut foreign_scope = config.dps.clone();
        foreign_scope.id_scope = String::try_from("0ne99Z8Y7X6").unwrap();
        assert_eq!(
            validate_credentials(&foreign_scope, &config.device),
            Err(ValidationError::ResourceMismatch)
        );
    }

    #[test]
    fn test_credentials_report_token_errors() {
        let config = provisioned_config();
        let truncated = DeviceCredentials::new("dev-002", "SharedAccessSignature sr=a&sig=b")
            .unwrap();
        assert_eq!(
            validate_credentials(&config.dps, &truncated),
            Err(ValidationError::Token(TokenError::MissingParameter(
                engraphe_token::Param::Expiry
            )))
        );
    }

    #[test]
    fn test_placeholder_token_reported_before_grammar() {
        let config = provisioned_config();
        let unprovisioned =
            DeviceCredentials::new("dev-002", defaults::PLACEHOLDER_SAS_TOKEN).unwrap();
        assert_eq!(
            validate_credentials(&config.dps, &unprovisioned),
            Err(ValidationError::Placeholder(Field::SasToken))
        );
    }

    proptest! {
        #[test]
        fn prop_registration_id_never_panics(id in "\\PC{0,160}") {
            let _ = validate_registration_id(&id);
        }
    }
}
