// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Encode and decode engines over a [`SchemaRegistry`](crate::SchemaRegistry).

pub mod cache;
pub mod decode;
pub mod encode;


pub use cache::HandlerStats;

/// Encode knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Skip the compatibility check on struct-typed fields.
    pub unchecked: bool,
}

/// Shape of a decoded struct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// [`Value::Struct`](crate::Value::Struct) tagged with the concrete type.
    #[default]
    Instance,
    /// [`Value::Record`](crate::Value::Record) with no type information.
    Plain,
    /// Like `Instance`, starting from the initializer defaults of every
    /// level of the concrete type.
    Construct,
}

/// Decode knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Ignore trailing input and skip the result type check.
    pub unchecked: bool,
    pub output: OutputMode,
}

impl DecodeOptions {
    pub fn unchecked() -> Self {
        Self {
            unchecked: true,
            ..Self::default()
        }
    }

    pub fn plain() -> Self {
        Self {
            output: OutputMode::Plain,
            ..Self::default()
        }
    }

    pub fn construct() -> Self {
        Self {
            output: OutputMode::Construct,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_unchecked(mut self, unchecked: bool) -> Self {
        self.unchecked = unchecked;
        self
    }
}
