//! Enrollment group membership
//!
//! A group enrollment shares one signing key across a fleet, but every
//! member still carries its own registration ID and a token scoped to
//! its own registration resource. This module models the member list a
//! manifest declares and the checks that keep it coherent.

use heapless::Vec;

use engraphe_token::SasToken;

use crate::config::{DeviceCredentials, DpsConfig};
use crate::validate::{validate_credentials, ValidationError};

/// Upper bound on devices a single manifest may declare
pub const MAX_GROUP_DEVICES: usize = 16;

/// Reasons a device cannot join the member list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GroupError {
    /// The member list is at capacity
    Full,
    /// Another member already uses this registration ID
    DuplicateRegistrationId,
    /// Another member already carries this token
    DuplicateToken,
}

/// The devices enrolled under one group enrollment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EnrollmentGroup {
    devices: Vec<DeviceCredentials, MAX_GROUP_DEVICES>,
}

impl EnrollmentGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Members in declaration order
    pub fn devices(&self) -> &[DeviceCredentials] {
        &self.devices
    }

    /// Look up a member by registration ID
    ///
    /// The service treats registration IDs case-insensitively, so the
    /// lookup does too.
    pub fn find(&self, registration_id: &str) -> Option<&DeviceCredentials> {
        self.devices
            .iter()
            .find(|device| device.registration_id.eq_ignore_ascii_case(registration_id))
    }

    /// Add a member, rejecting duplicates
    ///
    /// Two members may both have an empty token while a manifest is
    /// being filled in; a non-empty token must be unique because a
    /// token is scoped to a single registration resource.
    pub fn push(&mut self, device: DeviceCredentials) -> Result<(), GroupError> {
        if self.find(&device.registration_id).is_some() {
            return Err(GroupError::DuplicateRegistrationId);
        }
        if !device.sas_token.is_empty()
            && self
                .devices
                .iter()
                .any(|other| other.sas_token == device.sas_token)
        {
            return Err(GroupError::DuplicateToken);
        }
        self.devices.push(device).map_err(|_| GroupError::Full)
    }

    /// Validate every member against the shared service settings
    pub fn validate(&self, dps: &DpsConfig) -> Result<(), ValidationError> {
        for device in &self.devices {
            validate_credentials(dps, device)?;
        }
        Ok(())
    }

    /// Expiry of the member token that runs out first
    ///
    /// Tokens that do not parse are skipped; `validate` reports those.
    pub fn earliest_expiry(&self) -> Option<u64> {
        self.devices
            .iter()
            .filter_map(|device| SasToken::parse(&device.sas_token).ok())
            .map(|token| token.expires_at())
            .min()
    }
}
