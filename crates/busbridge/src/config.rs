// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bridge configuration - single source of truth for wire limits.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: Wire-format limits dictated by the D-Bus protocol
//! - **Level 2 (Dynamic)**: [`BridgeConfig`], loaded programmatically or from TOML
//!
//! ```ignore
//! use busbridge::config::*;
//!
//! let config = BridgeConfig::from_file("bridge.toml")?;
//! assert!(MAX_ARRAY_LEN <= MAX_MESSAGE_LEN);
//! ```

use crate::wire::{names, Endianness};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

// =======================================================================
// Wire limits (D-Bus specification, "Valid Signatures" / "Marshaling")
// =======================================================================

/// Maximum length of a signature string, in bytes.
pub const MAX_SIGNATURE_LEN: usize = 255;

/// Maximum byte length of a marshalled array (64 MiB).
pub const MAX_ARRAY_LEN: usize = 1 << 26;

/// Maximum size of a whole message (128 MiB).
pub const MAX_MESSAGE_LEN: usize = 1 << 27;

/// Maximum array nesting depth inside one complete type.
pub const MAX_ARRAY_DEPTH: usize = 32;

/// Maximum struct/dict-entry nesting depth inside one complete type.
pub const MAX_STRUCT_DEPTH: usize = 32;

/// Maximum total container depth, variants included.
pub const MAX_TOTAL_DEPTH: usize = 64;

/// Highest `argN` index accepted in a bus match rule (exclusive).
pub const MAX_MATCH_ARGS: usize = 64;

/// Maximum length of bus, interface and member names.
pub const MAX_NAME_LEN: usize = 255;

/// Prefix of notification names bound automatically when a signal is registered.
pub const CANONICAL_NAME_PREFIX: &str = "signal:";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which message bus the registry talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusType {
    #[default]
    Session,
    System,
}

/// Runtime configuration of a dispatch registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Bus this registry is attached to (informational, used in logs).
    #[serde(default)]
    pub bus_type: BusType,

    /// Deliver signal arguments fully boxed (`true`) or with native primitives.
    #[serde(default = "default_true")]
    pub deliver_boxed: bool,

    /// Byte order used for outgoing frames.
    #[serde(default)]
    pub endianness: Endianness,

    /// Object path stamped on posted signals when the caller gives none.
    #[serde(default = "default_object_path")]
    pub default_object_path: String,

    /// Catch panics raised by observer callbacks instead of unwinding into the transport loop.
    #[serde(default = "default_true")]
    pub isolate_observer_panics: bool,

    /// Capacity of the signature cache used for signals seen only on the wire.
    #[serde(default = "default_type_cache_capacity")]
    pub type_cache_capacity: usize,
}

fn default_true() -> bool {
    true
}

fn default_object_path() -> String {
    "/".to_string()
}

fn default_type_cache_capacity() -> usize {
    256
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bus_type: BusType::Session,
            deliver_boxed: true,
            endianness: Endianness::Little,
            default_object_path: default_object_path(),
            isolate_observer_panics: true,
            type_cache_capacity: default_type_cache_capacity(),
        }
    }
}

impl BridgeConfig {
    /// Default configuration for the session bus.
    pub fn session() -> Self {
        Self::default()
    }

    /// Default configuration for the system bus.
    pub fn system() -> Self {
        Self {
            bus_type: BusType::System,
            ..Default::default()
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        names::validate_object_path(&self.default_object_path).map_err(|e| {
            ConfigError::Invalid(format!("default_object_path: {}", e))
        })?;
        if self.type_cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "type_cache_capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
