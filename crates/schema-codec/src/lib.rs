// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # schema-codec - schema-driven binary serialization
//!
//! Deterministic, compact encoding of structured values against a runtime
//! schema registry. The layout is a strict superset of Borsh: little-endian,
//! no padding, no type tags beyond explicitly declared discriminators and
//! length prefixes. Types form single-inheritance hierarchies; discriminators
//! let a decoder pick the concrete subtype from the bytes alone.
//!
//! ## Quick Start
//!
//! ```rust
//! use schema_codec::{DecodeOptions, SchemaRegistry, StructValue, TypeDescriptor, Value};
//!
//! let mut registry = SchemaRegistry::new();
//! registry.define("Shape").finish()?;
//! registry
//!     .define("Circle")
//!     .extends("Shape")
//!     .discriminator(0u8)
//!     .field("radius", TypeDescriptor::u32())
//!     .finish()?;
//! registry
//!     .define("Square")
//!     .extends("Shape")
//!     .discriminator(1u8)
//!     .field("side", TypeDescriptor::u16())
//!     .finish()?;
//! registry.validate(&["Shape"])?;
//!
//! let square = Value::Struct(StructValue::new("Square").with("side", 7u16));
//! let bytes = registry.encode(&square)?;
//! assert_eq!(bytes, vec![1, 7, 0]);
//!
//! // Decoding against the base type resolves the subtype.
//! let decoded = registry.decode(&bytes, "Shape", DecodeOptions::default())?;
//! assert_eq!(decoded, square);
//! # Ok::<(), schema_codec::CodecError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                          SchemaRegistry                             |
//! |   TypeNode graph | StructSchema per level | CodecConfig (ArcSwap)   |
//! +---------------------------------------------------------------------+
//! |                            Engine                                   |
//! |   EncodePlan / DecodePlan compiled once | HandlerCache (DashMap)    |
//! +---------------------------------------------------------------------+
//! |                           Core codec                                |
//! |   BufferWriter (deferred writes) | BufferReader (zero-copy) | U256  |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SchemaRegistry`] | Type graph, schemas and compiled handlers |
//! | [`TypeDescriptor`] | Wire layout of one field |
//! | [`Discriminator`] | Byte, byte sequence or string selecting a subtype |
//! | [`Value`] | Dynamic value encoded from and decoded into |
//! | [`StructValue`] | Instance of a registered type |
//!
//! ## Concurrency
//!
//! Registration takes `&mut SchemaRegistry`; encode and decode take `&self`
//! and may run from many threads at once. [`global()`] provides a
//! process-wide registry behind a `parking_lot::RwLock`.

/// Codec limits and runtime-swappable configuration.
pub mod config;
/// Primitive wire codec, buffer writer/reader and wide integers.
pub mod core;
/// Encode/decode engines and the compiled handler cache.
pub mod engine;
/// Error types for registration, encoding and decoding.
pub mod error;
/// Descriptors, discriminators, type registry and validation.
pub mod schema;
/// Dynamic values.
pub mod value;

pub use config::{CodecConfig, ConfigError};
pub use crate::core::ser::{BufferReader, BufferWriter, LengthPrefix, PrimitiveKind};
pub use crate::core::wide::{U256, U512};
pub use engine::{DecodeOptions, EncodeOptions, HandlerStats, OutputMode};
pub use error::{
    CodecError, DecodeError, DecodeErrorKind, DecodeResult, EncodeError, EncodeErrorKind,
    EncodeResult, FieldPath, PathSegment, SchemaError, SchemaResult,
};
pub use schema::{
    Discriminator, DiscriminatorKind, FieldCodec, FnCodec, MemoizedEncoding, SchemaRegistry,
    StructBuilder, StructCodec, TypeDescriptor, ValidateOptions,
};
pub use value::{Fields, FromValue, StructValue, Value};

use parking_lot::RwLock;
use std::sync::OnceLock;

static GLOBAL: OnceLock<RwLock<SchemaRegistry>> = OnceLock::new();

/// Process-wide registry.
///
/// Register under the write lock, encode/decode under read locks:
///
/// ```rust
/// use schema_codec::{global, DecodeOptions, StructValue, TypeDescriptor, Value};
///
/// global()
///     .write()
///     .define("Ping")
///     .field("seq", TypeDescriptor::u32())
///     .finish()
///     .unwrap();
///
/// let registry = global().read();
/// let bytes = registry
///     .encode(&Value::Struct(StructValue::new("Ping").with("seq", 9u32)))
///     .unwrap();
/// assert_eq!(bytes, vec![9, 0, 0, 0]);
/// assert!(registry.decode(&bytes, "Ping", DecodeOptions::default()).is_ok());
/// ```
pub fn global() -> &'static RwLock<SchemaRegistry> {
    GLOBAL.get_or_init(|| RwLock::new(SchemaRegistry::new()))
}
