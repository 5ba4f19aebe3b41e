//! Configuration persistence
//!
//! Loads the device configuration from flash storage and writes it
//! back. Falls back to embedded defaults if flash is empty.

use core::str;

use engraphe_hal::{FlashError, FlashStorage, StorageKey};

use crate::config::defaults;
use crate::config::manifest::{parse_manifest, ParseError};
use crate::config::types::{DeviceConfig, CONFIG_VERSION};

/// Maximum serialized config size (binary)
pub const MAX_CONFIG_SIZE: usize = 1024;

/// Maximum manifest text size
pub const MAX_MANIFEST_SIZE: usize = 4096;

/// Configuration persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Flash operation failed
    Flash(FlashError),
    /// Binary deserialization failed
    Deserialize,
    /// Binary serialization failed
    Serialize,
    /// Manifest text did not parse
    Manifest(ParseError),
    /// Invalid UTF-8 in manifest data
    InvalidUtf8,
    /// Config version mismatch
    VersionMismatch,
}

impl From<FlashError> for StoreError {
    fn from(e: FlashError) -> Self {
        StoreError::Flash(e)
    }
}

impl From<ParseError> for StoreError {
    fn from(e: ParseError) -> Self {
        StoreError::Manifest(e)
    }
}

/// Configuration store over a flash backend
///
/// Handles loading the device configuration from flash storage.
pub struct ConfigStore<S: FlashStorage> {
    storage: S,
}

impl<S: FlashStorage> ConfigStore<S> {
    /// Create a new configuration store
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Consume the store and return the underlying storage
    ///
    /// Use this to reclaim the flash handle after loading config, so it
    /// can be passed to other tasks.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Load configuration from flash
    ///
    /// Tries the TOML manifest first, falls back to the binary postcard
    /// record. Returns the loaded config, or an error if neither slot
    /// holds a usable one.
    pub async fn load(&mut self) -> Result<DeviceConfig, StoreError> {
        info!("Loading configuration from flash");

        // Try the manifest first
        match self.load_manifest().await {
            Ok(config) => {
                info!("Loaded configuration from manifest");
                return Ok(config);
            }
            Err(StoreError::Flash(FlashError::NotFound)) => {
                debug!("No manifest found, trying binary format");
            }
            Err(e) => {
                warn!("Failed to load manifest: {:?}, trying binary", e);
            }
        }

        // Fall back to binary postcard format
        self.load_binary().await
    }

    /// Load configuration, falling back to the embedded defaults
    pub async fn load_or_default(&mut self) -> DeviceConfig {
        match self.load().await {
            Ok(config) => config,
            Err(e) => {
                warn!("No stored configuration ({:?}), using embedded defaults", e);
                defaults::embedded_default()
            }
        }
    }

    /// Write the configuration back as a binary postcard record
    pub async fn save(&mut self, config: &DeviceConfig) -> Result<(), StoreError> {
        let mut buffer = [0u8; MAX_CONFIG_SIZE];
        let used = postcard::to_slice(config, &mut buffer).map_err(|_| StoreError::Serialize)?;
        self.storage.write(StorageKey::DeviceConfig, used).await?;
        debug!("Saved {} bytes of binary config", used.len());
        Ok(())
    }

    /// Load configuration from the TOML manifest slot
    async fn load_manifest(&mut self) -> Result<DeviceConfig, StoreError> {
        let mut buffer = [0u8; MAX_MANIFEST_SIZE];
        let len = self
            .storage
            .read(StorageKey::DeviceManifest, &mut buffer)
            .await?;

        debug!("Read {} bytes of manifest from flash", len);

        let text = str::from_utf8(&buffer[..len]).map_err(|_| StoreError::InvalidUtf8)?;
        let config = parse_manifest(text)?.into_device_config()?;

        log_config_summary(&config);
        Ok(config)
    }

    /// Load configuration from the binary postcard slot
    async fn load_binary(&mut self) -> Result<DeviceConfig, StoreError> {
        let mut buffer = [0u8; MAX_CONFIG_SIZE];
        let len = self
            .storage
            .read(StorageKey::DeviceConfig, &mut buffer)
            .await?;

        debug!("Read {} bytes of binary config from flash", len);

        let config: DeviceConfig =
            postcard::from_bytes(&buffer[..len]).map_err(|_| StoreError::Deserialize)?;

        if config.version != CONFIG_VERSION {
            warn!(
                "Config version mismatch: found {}, expected {}",
                config.version, CONFIG_VERSION
            );
            return Err(StoreError::VersionMismatch);
        }

        log_config_summary(&config);
        Ok(config)
    }
}

/// Log a summary of the loaded configuration
///
/// The passphrase and the token stay out of the logs.
fn log_config_summary(config: &DeviceConfig) {
    info!("Configuration loaded successfully");
    debug!("  wifi ssid {}", config.wifi.ssid.as_str());
    debug!("  endpoint {}", config.dps.endpoint.as_str());
    debug!(
        "  registration id {}",
        config.device.registration_id.as_str()
    );
}
