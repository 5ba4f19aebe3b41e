//! Per-device enrollment image
//!
//! Embeds the `device.toml` manifest into the firmware image and turns
//! it into a ready-to-use configuration. The build script checks the
//! manifest's shape at compile time, so a structurally broken file never
//! reaches a device. Placeholder (`***`) credentials build fine but
//! block registration at run time until they are filled in.

#![no_std]
#![deny(unsafe_code)]

use engraphe_core::config::manifest::{parse_manifest, Manifest, ParseError};
use engraphe_core::config::DeviceConfig;
use engraphe_core::request::{RegistrationRequest, RequestError};

/// Embedded device manifest (compiled into the image)
/// Edit device.toml and rebuild to customize
pub const DEVICE_MANIFEST: &str = include_str!("../device.toml");

/// Errors turning the embedded manifest into a usable configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ManifestError {
    /// The embedded manifest does not parse or names no single device
    Parse(ParseError),
    /// The parsed configuration cannot register (placeholders remain,
    /// or a credential is structurally invalid)
    Request(RequestError),
}

impl From<ParseError> for ManifestError {
    fn from(e: ParseError) -> Self {
        ManifestError::Parse(e)
    }
}

impl From<RequestError> for ManifestError {
    fn from(e: RequestError) -> Self {
        ManifestError::Request(e)
    }
}

/// Parse the embedded manifest
pub fn manifest() -> Result<Manifest, ManifestError> {
    Ok(parse_manifest(DEVICE_MANIFEST)?)
}

/// Build the device configuration from the embedded manifest
///
/// The manifest must describe exactly one device.
pub fn device_config() -> Result<DeviceConfig, ManifestError> {
    Ok(manifest()?.into_device_config()?)
}

/// Assemble the registration request for the embedded configuration
///
/// Fails while placeholder credentials remain in device.toml.
pub fn registration_request() -> Result<RegistrationRequest, ManifestError> {
    Ok(RegistrationRequest::from_config(&device_config()?)?)
}
