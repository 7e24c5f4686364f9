// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec limits and defaults.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: compile-time constants (default prefix width, limits)
//! - **Level 2 (Dynamic)**: [`CodecConfig`], held by every
//!   [`SchemaRegistry`](crate::SchemaRegistry) behind an `ArcSwap` and
//!   replaceable at runtime without locking encode/decode traffic
//!
//! # Example
//!
//! ```
//! use schema_codec::{CodecConfig, SchemaRegistry};
//!
//! let registry = SchemaRegistry::new();
//! registry.set_config(CodecConfig {
//!     max_prealloc_elements: 4096,
//!     ..CodecConfig::default()
//! })
//! .unwrap();
//! assert_eq!(registry.config().max_prealloc_elements, 4096);
//! ```

use crate::core::ser::LengthPrefix;
use std::fmt;

// =======================================================================
// Static defaults
// =======================================================================

/// Prefix width used by `string()`, `bytes()` and `vec()` descriptors.
pub const DEFAULT_LENGTH_PREFIX: LengthPrefix = LengthPrefix::U32;

/// Upper bound on elements reserved up front when decoding a list.
///
/// The announced length is attacker controlled; elements beyond this are
/// still decoded, the vector just grows on demand.
pub const MAX_PREALLOC_ELEMENTS: usize = 1024 * 1024;

/// Upper bound on any ancestor walk.
pub const MAX_HIERARCHY_DEPTH: usize = 250;

/// Upper bound on nested struct frames during one decode.
pub const MAX_NESTING_DEPTH: usize = 512;

// =======================================================================
// Runtime configuration
// =======================================================================

/// Tunable limits.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "config-loaders",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct CodecConfig {
    pub max_prealloc_elements: usize,
    pub max_hierarchy_depth: usize,
    pub max_nesting_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_prealloc_elements: MAX_PREALLOC_ELEMENTS,
            max_hierarchy_depth: MAX_HIERARCHY_DEPTH,
            max_nesting_depth: MAX_NESTING_DEPTH,
        }
    }
}

/// Configuration could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Input is not valid JSON for [`CodecConfig`].
    Parse(String),
    /// A limit is zero.
    Invalid { field: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "invalid codec config: {}", msg),
            Self::Invalid { field } => write!(f, "codec config field {} must be non-zero", field),
        }
    }
}

impl std::error::Error for ConfigError {}

impl CodecConfig {
    /// Reject zero limits.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.max_hierarchy_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_hierarchy_depth",
            });
        }
        if self.max_nesting_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_nesting_depth",
            });
        }
        Ok(())
    }

    /// Parse from JSON; missing keys keep their defaults.
    #[cfg(feature = "config-loaders")]
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    #[cfg(feature = "config-loaders")]
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
