//! Configuration types and persistence
//!
//! Device provisioning configuration, stored in flash as a TOML manifest
//! or as postcard binary data.

pub mod defaults;
pub mod manifest;
pub mod persist;
pub mod types;

pub use manifest::{Manifest, ParseError};
pub use persist::{ConfigStore, StoreError};
pub use types::*;
