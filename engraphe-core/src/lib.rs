//! Board-agnostic provisioning configuration logic
//!
//! This crate contains everything a device needs to carry, check, and
//! persist its DPS group-enrollment credentials, independent of the
//! hardware it runs on:
//!
//! - Configuration type definitions (Wi-Fi, provisioning endpoint,
//!   per-device credentials)
//! - Embedded defaults and placeholder detection
//! - Structural validation (hostname shape, ID rules, token checks)
//! - Enrollment group bookkeeping (uniqueness across devices)
//! - Manifest parsing and flash persistence
//! - Registration request assembly for the connecting firmware

#![no_std]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod config;
pub mod group;
pub mod request;
pub mod validate;
