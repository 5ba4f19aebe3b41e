//! Shared Access Signature token grammar
//!
//! This crate defines the SAS token format a device presents when it
//! registers with the Azure IoT Device Provisioning Service. Tokens are
//! minted offline by operator tooling from the enrollment group key;
//! firmware only parses, inspects, and carries them. No signing or key
//! derivation happens here.
//!
//! # Token Overview
//!
//! A token is a single line of text:
//! ```text
//! ┌───────────────────────┬───────────────┬─────────────────┬─────────────┬────────────────┐
//! │ SharedAccessSignature │ sr=<resource> │ sig=<signature> │ se=<expiry> │ skn=<key-name> │
//! │ prefix + one space    │ URI-encoded   │ URI-encoded     │ UNIX secs   │ policy name    │
//! └───────────────────────┴───────────────┴─────────────────┴─────────────┴────────────────┘
//! ```
//!
//! Parameters are `&`-separated `key=value` pairs and may appear in any
//! order. `skn` is optional in the grammar; device registration tokens
//! carry `skn=registration`.

#![no_std]
#![deny(unsafe_code)]

pub mod percent;
pub mod token;

pub use percent::PercentError;
pub use token::{
    Param, SasToken, TokenError, MAX_TOKEN_TEXT, REGISTRATION_KEY_NAME, TOKEN_PREFIX,
};
