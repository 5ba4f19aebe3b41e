//! TOML-subset parser for device manifests
//!
//! This is a minimal parser that handles only the subset needed for an
//! enrollment manifest. It does NOT support the full TOML spec.
//!
//! Supported features:
//! - `key = "value"` pairs (quoted or bare strings)
//! - `[wifi]`, `[provisioning]`, `[device]` section headers
//! - `[device.<registration-id>]` headers for group manifests
//! - Comments (`# ...`), including inline after a value
//!
//! NOT supported:
//! - Multi-line strings
//! - Integers, booleans, datetimes, arrays, inline tables
//! - Dotted keys outside section headers
//!
//! Unknown keys are ignored so old firmware can read newer manifests;
//! unknown sections are errors because a whole misspelled section means
//! its values silently vanish.

use heapless::String;

use crate::config::types::{
    DeviceConfig, DeviceCredentials, DpsConfig, WifiConfig, CONFIG_VERSION,
    MAX_REGISTRATION_ID_LEN,
};
use crate::group::{EnrollmentGroup, GroupError};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Section header outside the manifest schema
    InvalidSection,
    /// A value does not fit its field capacity
    ValueTooLong,
    /// Device entry violates group membership rules
    Group(GroupError),
    /// Conversion requires exactly one device entry
    NotSingleDevice,
    /// No device entry with the requested registration ID
    UnknownDevice,
}

impl From<GroupError> for ParseError {
    fn from(err: GroupError) -> Self {
        Self::Group(err)
    }
}

/// Current parsing context
#[derive(Debug, Clone)]
enum Section {
    Root,
    Wifi,
    Provisioning,
    /// A `[device]` section, or `[device.<name>]` with its name
    Device(Option<String<MAX_REGISTRATION_ID_LEN>>),
}

/// A parsed enrollment manifest
///
/// Shared Wi-Fi and provisioning settings plus one device entry (a
/// device image) or several (a fleet manifest). The provisioning
/// endpoint keeps its public default when the manifest omits it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Manifest {
    pub wifi: WifiConfig,
    pub dps: DpsConfig,
    pub group: EnrollmentGroup,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a single-device manifest into the active configuration
    pub fn into_device_config(self) -> Result<DeviceConfig, ParseError> {
        let device = match self.group.devices() {
            [device] => device.clone(),
            _ => return Err(ParseError::NotSingleDevice),
        };
        Ok(DeviceConfig {
            version: CONFIG_VERSION,
            wifi: self.wifi,
            dps: self.dps,
            device,
        })
    }

    /// Build the active configuration for one member of a fleet manifest
    pub fn device_config(&self, registration_id: &str) -> Result<DeviceConfig, ParseError> {
        let device = self
            .group
            .find(registration_id)
            .cloned()
            .ok_or(ParseError::UnknownDevice)?;
        Ok(DeviceConfig {
            version: CONFIG_VERSION,
            wifi: self.wifi.clone(),
            dps: self.dps.clone(),
            device,
        })
    }
}

/// Parse manifest text into a [`Manifest`]
pub fn parse_manifest(input: &str) -> Result<Manifest, ParseError> {
    let mut manifest = Manifest::new();
    let mut section = Section::Root;
    let mut current_device: Option<DeviceCredentials> = None;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Check for section header
        if line.starts_with('[') && line.ends_with(']') {
            save_device(&mut manifest, &mut current_device)?;
            section = parse_section_header(&line[1..line.len() - 1])?;
            if let Section::Device(name) = &section {
                let mut device = DeviceCredentials::default();
                if let Some(name) = name {
                    device.registration_id = name.clone();
                }
                current_device = Some(device);
            }
            continue;
        }

        // Parse key = value
        if let Some((key, value)) = parse_key_value(line) {
            apply_value(&section, key, value, &mut manifest, &mut current_device)?;
        }
    }

    // Save final device section
    save_device(&mut manifest, &mut current_device)?;

    Ok(manifest)
}

/// Parse a section header like "wifi" or "device.dev-002"
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    let header = header.trim();

    if let Some(name) = header.strip_prefix("device.") {
        let name = String::try_from(name.trim()).map_err(|_| ParseError::InvalidSection)?;
        return Ok(Section::Device(Some(name)));
    }

    match header {
        "wifi" => Ok(Section::Wifi),
        "provisioning" => Ok(Section::Provisioning),
        "device" => Ok(Section::Device(None)),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Parse a "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = if let Some(hash_pos) = value.find('#') {
        // Make sure # is not inside a string
        let quote_count = value[..hash_pos].matches('"').count();
        if quote_count % 2 == 0 {
            value[..hash_pos].trim()
        } else {
            value
        }
    } else {
        value
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Strip surrounding quotes; bare strings pass through
fn parse_string(value: &str) -> &str {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn parse_field<const N: usize>(value: &str) -> Result<String<N>, ParseError> {
    String::try_from(parse_string(value)).map_err(|_| ParseError::ValueTooLong)
}

/// Apply a parsed value to the appropriate manifest field
fn apply_value(
    section: &Section,
    key: &str,
    value: &str,
    manifest: &mut Manifest,
    current_device: &mut Option<DeviceCredentials>,
) -> Result<(), ParseError> {
    match section {
        Section::Wifi => match key {
            "ssid" => manifest.wifi.ssid = parse_field(value)?,
            "password" => manifest.wifi.passphrase = parse_field(value)?,
            _ => {} // Ignore unknown keys
        },
        Section::Provisioning => match key {
            "endpoint" => manifest.dps.endpoint = parse_field(value)?,
            "id_scope" => manifest.dps.id_scope = parse_field(value)?,
            _ => {}
        },
        Section::Device(name) => {
            let device = current_device.as_mut().ok_or(ParseError::InvalidSection)?;
            match key {
                // A named section already fixed the registration ID
                "registration_id" if name.is_none() => {
                    device.registration_id = parse_field(value)?;
                }
                "sas_token" => device.sas_token = parse_field(value)?,
                _ => {}
            }
        }
        Section::Root => {}
    }

    Ok(())
}

/// Push a completed device section into the group
fn save_device(
    manifest: &mut Manifest,
    current_device: &mut Option<DeviceCredentials>,
) -> Result<(), ParseError> {
    if let Some(device) = current_device.take() {
        manifest.group.push(device)?;
    }
    Ok(())
}
