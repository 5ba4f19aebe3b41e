//! Engraphe Hardware Abstraction Layer
//!
//! This crate defines the storage abstraction used to persist device
//! provisioning configuration. Chip-specific flash drivers implement
//! [`flash::FlashStorage`]; the configuration store in `engraphe-core`
//! is written against the trait and never touches hardware directly.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  Configuration store (engraphe-core)     │
//! └──────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌──────────────────────────────────────────┐
//! │  engraphe-hal (this crate - traits)      │
//! └──────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌──────────────────────────────────────────┐
//! │  Chip-specific flash driver (firmware)   │
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`flash::FlashStorage`] - Persistent key-value storage

#![no_std]
#![deny(unsafe_code)]

pub mod flash;

// Re-export key traits at crate root for convenience
pub use flash::{FlashError, FlashStorage, StorageKey};
