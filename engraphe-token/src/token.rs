//! SAS token parsing and assembly
//!
//! Token format:
//! - PREFIX: the literal `SharedAccessSignature` followed by one space
//! - sr: URI-encoded resource the token grants access to
//! - sig: URI-encoded signature, treated as opaque text
//! - se: expiry as decimal UNIX seconds
//! - skn: policy name; optional, `registration` for device registration

use core::fmt;

use heapless::String;

use crate::percent;

/// Token scheme prefix, including the separating space
pub const TOKEN_PREFIX: &str = "SharedAccessSignature ";

/// Policy name DPS expects on device registration tokens
pub const REGISTRATION_KEY_NAME: &str = "registration";

/// Maximum length of the encoded `sr` parameter
pub const MAX_RESOURCE_LEN: usize = 256;

/// Maximum length of the encoded `sig` parameter
pub const MAX_SIGNATURE_LEN: usize = 128;

/// Maximum length of the `skn` parameter
pub const MAX_KEY_NAME_LEN: usize = 32;

/// Maximum canonical token text (PREFIX + sr + sig + 20-digit se + skn)
pub const MAX_TOKEN_TEXT: usize = TOKEN_PREFIX.len()
    + 3
    + MAX_RESOURCE_LEN
    + 5
    + MAX_SIGNATURE_LEN
    + 4
    + 20
    + 5
    + MAX_KEY_NAME_LEN;

/// Token parameter names, used in error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Param {
    /// `sr`, the resource URI
    Resource,
    /// `sig`, the signature
    Signature,
    /// `se`, the expiry
    Expiry,
    /// `skn`, the key name
    KeyName,
}

/// Errors that can occur during token parsing or assembly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TokenError {
    /// Token does not start with `SharedAccessSignature `
    MissingPrefix,
    /// A required parameter is absent
    MissingParameter(Param),
    /// A parameter appears more than once
    DuplicateParameter(Param),
    /// A parameter outside the grammar
    UnknownParameter,
    /// A parameter has no `=` or an empty value
    MalformedParameter,
    /// `se` is not a decimal UNIX timestamp
    InvalidExpiry,
    /// `sr` or `sig` is not URI-encoded text
    InvalidEncoding(Param),
    /// A component exceeds its capacity
    TooLong(Param),
    /// Output buffer too small for the token text
    BufferTooSmall,
}

/// A parsed or assembled shared-access-signature token
///
/// Fields are kept exactly as they appear on the wire: `sr` and `sig`
/// stay URI-encoded. Construction goes through [`SasToken::parse`] or
/// [`SasToken::assemble`], both of which enforce the grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SasToken {
    resource: String<MAX_RESOURCE_LEN>,
    signature: String<MAX_SIGNATURE_LEN>,
    expires_at: u64,
    key_name: Option<String<MAX_KEY_NAME_LEN>>,
}

impl SasToken {
    /// Parse a token from its text form
    ///
    /// Strict: the prefix must match exactly, parameters may appear in
    /// any order but none may repeat, `sr`/`sig`/`se` are required, and
    /// parameters outside the grammar are rejected.
    pub fn parse(input: &str) -> Result<Self, TokenError> {
        let rest = input
            .strip_prefix(TOKEN_PREFIX)
            .ok_or(TokenError::MissingPrefix)?;

        let mut resource: Option<String<MAX_RESOURCE_LEN>> = None;
        let mut signature: Option<String<MAX_SIGNATURE_LEN>> = None;
        let mut expires_at: Option<u64> = None;
        let mut key_name: Option<String<MAX_KEY_NAME_LEN>> = None;

        for pair in rest.split('&') {
            let (key, value) = pair.split_once('=').ok_or(TokenError::MalformedParameter)?;
            if value.is_empty() {
                return Err(TokenError::MalformedParameter);
            }
            match key {
                "sr" => {
                    if resource.is_some() {
                        return Err(TokenError::DuplicateParameter(Param::Resource));
                    }
                    percent::validate(value)
                        .map_err(|_| TokenError::InvalidEncoding(Param::Resource))?;
                    let value = String::try_from(value)
                        .map_err(|_| TokenError::TooLong(Param::Resource))?;
                    resource = Some(value);
                }
                "sig" => {
                    if signature.is_some() {
                        return Err(TokenError::DuplicateParameter(Param::Signature));
                    }
                    percent::validate(value)
                        .map_err(|_| TokenError::InvalidEncoding(Param::Signature))?;
                    let value = String::try_from(value)
                        .map_err(|_| TokenError::TooLong(Param::Signature))?;
                    signature = Some(value);
                }
                "se" => {
                    if expires_at.is_some() {
                        return Err(TokenError::DuplicateParameter(Param::Expiry));
                    }
                    if !value.bytes().all(|b| b.is_ascii_digit()) {
                        return Err(TokenError::InvalidExpiry);
                    }
                    let se = value.parse::<u64>().map_err(|_| TokenError::InvalidExpiry)?;
                    expires_at = Some(se);
                }
                "skn" => {
                    if key_name.is_some() {
                        return Err(TokenError::DuplicateParameter(Param::KeyName));
                    }
                    let value = String::try_from(value)
                        .map_err(|_| TokenError::TooLong(Param::KeyName))?;
                    key_name = Some(value);
                }
                _ => return Err(TokenError::UnknownParameter),
            }
        }

        Ok(Self {
            resource: resource.ok_or(TokenError::MissingParameter(Param::Resource))?,
            signature: signature.ok_or(TokenError::MissingParameter(Param::Signature))?,
            expires_at: expires_at.ok_or(TokenError::MissingParameter(Param::Expiry))?,
            key_name,
        })
    }

    /// Assemble a token from already computed parts
    ///
    /// `resource_uri` and `signature` are raw text and get URI-encoded
    /// here. The signature is whatever the operator tooling produced;
    /// this function performs no signing.
    pub fn assemble(
        resource_uri: &str,
        signature: &str,
        expires_at: u64,
        key_name: Option<&str>,
    ) -> Result<Self, TokenError> {
        let resource = percent::encode::<MAX_RESOURCE_LEN>(resource_uri)
            .map_err(|_| TokenError::TooLong(Param::Resource))?;
        let signature = percent::encode::<MAX_SIGNATURE_LEN>(signature)
            .map_err(|_| TokenError::TooLong(Param::Signature))?;
        let key_name = match key_name {
            Some(name) => {
                Some(String::try_from(name).map_err(|_| TokenError::TooLong(Param::KeyName))?)
            }
            None => None,
        };

        Ok(Self {
            resource,
            signature,
            expires_at,
            key_name,
        })
    }

    /// URI-encoded resource (`sr`), as transmitted
    pub fn resource(&self) -> &str {
        self.resource.as_str()
    }

    /// URI-encoded signature (`sig`)
    pub fn signature(&self) -> &str {
        self.signature.as_str()
    }

    /// Expiry in UNIX seconds (`se`)
    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    /// Policy name (`skn`), if present
    pub fn key_name(&self) -> Option<&str> {
        self.key_name.as_deref()
    }

    /// Whether the token is expired at the given UNIX time
    pub fn is_expired(&self, now_unix: u64) -> bool {
        now_unix >= self.expires_at
    }

    /// Whether `sr` decodes to the given raw resource URI
    ///
    /// Compares decoded text, so equivalent encodings (`%2F` vs `%2f`)
    /// match the same URI.
    pub fn resource_matches(&self, resource_uri: &str) -> bool {
        match percent::decode::<MAX_RESOURCE_LEN>(&self.resource) {
            Ok(decoded) => decoded.as_str() == resource_uri,
            Err(_) => false,
        }
    }

    /// Render the canonical token text into a heapless string
    ///
    /// Canonical parameter order is `sr`, `sig`, `se`, `skn`.
    pub fn to_text<const N: usize>(&self) -> Result<String<N>, TokenError> {
        use core::fmt::Write;

        let mut out: String<N> = String::new();
        write!(out, "{}", self).map_err(|_| TokenError::BufferTooSmall)?;
        Ok(out)
    }

    /// Encode the canonical token text into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn write_into(&self, buffer: &mut [u8]) -> Result<usize, TokenError> {
        let text = self.to_text::<MAX_TOKEN_TEXT>()?;
        let bytes = text.as_bytes();
        if buffer.len() < bytes.len() {
            return Err(TokenError::BufferTooSmall);
        }
        buffer[..bytes.len()].copy_from_slice(bytes);
        Ok(bytes.len())
    }
}

impl fmt::Display for SasToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}sr={}&sig={}&se={}",
            TOKEN_PREFIX, self.resource, self.signature, self.expires_at
        )?;
        if let Some(ref key_name) = self.key_name {
            write!(f, "&skn={}", key_name)?;
        }
        Ok(())
    }
}
