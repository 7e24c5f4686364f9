// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy for registration, validation, encoding and decoding.
//!
//! [`SchemaError`] describes a malformed or ambiguous registry. [`EncodeError`]
//! and [`DecodeError`] pair a kind with a [`FieldPath`] that grows outward as
//! the error crosses nested struct and list frames, so the rendered message
//! names the exact field that failed:
//!
//! ```text
//! Out of range value: >= 0 and <= 255, 256. Error originated at field path: inner.values[2]
//! ```

use std::fmt;

/// One step of a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// Location of a failure inside a value, outermost segment first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn prepend(&mut self, segment: PathSegment) {
        self.0.insert(0, segment);
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => write!(f, "{}", name)?,
                PathSegment::Field(name) => write!(f, ".{}", name)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

// ============================================================================
// Schema errors
// ============================================================================

/// Registry is malformed, incomplete or ambiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Type name was never declared.
    UnknownType { type_name: String },
    /// Type was already declared under another parent.
    ParentMismatch {
        type_name: String,
        existing: Option<String>,
        requested: String,
    },
    /// Ancestor walk exceeded the configured depth (likely a cycle).
    HierarchyTooDeep { type_name: String, limit: usize },
    /// A field slot below the highest registered index is empty.
    IndexGap { type_name: String, index: usize },
    /// Two fields claim the same explicit index.
    DuplicateFieldIndex {
        type_name: String,
        index: usize,
        existing: String,
        key: String,
    },
    /// Field re-registered with an explicit index different from its slot.
    FieldIndexConflict {
        type_name: String,
        key: String,
        current: usize,
        requested: usize,
    },
    /// Two siblings share a discriminator value.
    DuplicateDiscriminator {
        ancestor: String,
        first: String,
        second: String,
        discriminator: String,
    },
    /// Siblings use different discriminator kinds.
    InconsistentDiscriminatorKind {
        ancestor: String,
        first: String,
        first_kind: String,
        second: String,
        second_kind: String,
    },
    /// A struct-typed field references a type with no reachable schema.
    UnresolvedType {
        type_name: String,
        field: String,
        referenced: String,
    },
    /// Ancestor has several descendants and none of them is discriminated.
    AmbiguousHierarchy {
        ancestor: String,
        descendants: Vec<String>,
    },
    /// No schema anywhere in the type's chain.
    NotRegistered { type_name: String },
    /// Discriminator prefix requested across a level that declares fields.
    PrefixUndefined { type_name: String, level: String },
    /// Two levels of one chain both cache into the value's memo slot.
    MemoConflict {
        type_name: String,
        first: String,
        second: String,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownType { type_name } => write!(f, "Unknown type: {}", type_name),
            Self::ParentMismatch {
                type_name,
                existing,
                requested,
            } => write!(
                f,
                "Type {} is already declared with parent {}, cannot re-declare under {}",
                type_name,
                existing.as_deref().unwrap_or("<none>"),
                requested
            ),
            Self::HierarchyTooDeep { type_name, limit } => write!(
                f,
                "Inheritance chain of {} exceeds {} levels",
                type_name, limit
            ),
            Self::IndexGap { type_name, index } => write!(
                f,
                "Field is missing definition at index {} of {}, most likely due to field indexing with missing indices",
                index, type_name
            ),
            Self::DuplicateFieldIndex {
                type_name,
                index,
                existing,
                key,
            } => write!(
                f,
                "Multiple fields defined at the same index: {}, class: {} ({} and {})",
                index, type_name, existing, key
            ),
            Self::FieldIndexConflict {
                type_name,
                key,
                current,
                requested,
            } => write!(
                f,
                "Field {} of {} is already registered at index {}, cannot move it to {}",
                key, type_name, current, requested
            ),
            Self::DuplicateDiscriminator {
                ancestor,
                first,
                second,
                discriminator,
            } => write!(
                f,
                "Variant of {}: {} is the same as for {} (both extend {}) which is not allowed (non-determinism)",
                second, discriminator, first, ancestor
            ),
            Self::InconsistentDiscriminatorKind {
                ancestor,
                first,
                first_kind,
                second,
                second_kind,
            } => write!(
                f,
                "Class {} is extended by classes with variants of different types: {} ({}) and {} ({})",
                ancestor, first, first_kind, second, second_kind
            ),
            Self::UnresolvedType {
                type_name,
                field,
                referenced,
            } => write!(
                f,
                "Unknown field type: {} (field {} of {})",
                referenced, field, type_name
            ),
            Self::AmbiguousHierarchy {
                ancestor,
                descendants,
            } => write!(
                f,
                "Classes inherit {} and are introducing new fields without introducing variants ({}). This leads to non-deterministic deserialization",
                ancestor,
                descendants.join(", ")
            ),
            Self::NotRegistered { type_name } => {
                write!(f, "Class {} is missing in schema", type_name)
            }
            Self::PrefixUndefined { type_name, level } => write!(
                f,
                "Discriminator of {} can not be resolved since super class {} contains fields",
                type_name, level
            ),
            Self::MemoConflict {
                type_name,
                first,
                second,
            } => write!(
                f,
                "Levels {} and {} of {} both memoize their encoding, but a value has a single memo slot",
                first, second, type_name
            ),
        }
    }
}

impl std::error::Error for SchemaError {}

// ============================================================================
// Encode errors
// ============================================================================

/// What went wrong while encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeErrorKind {
    /// Integer does not fit the declared width or length prefix.
    OutOfRange { range: String, value: String },
    /// NaN float.
    NotANumber { kind: &'static str },
    /// Required field is null or absent.
    MissingField { field: String, expected: String },
    /// Value shape or polymorphic type does not match the declaration.
    TypeMismatch { expected: String, found: String },
    /// Fixed-length array of the wrong length.
    LengthMismatch { expected: usize, found: usize },
    Schema(SchemaError),
    /// Raised by a user supplied codec.
    Custom(String),
}

impl fmt::Display for EncodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { range, value } => {
                write!(f, "Out of range value: {}, {}", range, value)
            }
            Self::NotANumber { kind } => write!(f, "NaN is not supported for {}", kind),
            Self::MissingField { field, expected } => write!(
                f,
                "Trying to serialize a null value to field \"{}\" which is not allowed since the field is not decorated with \"option(...)\" but \"{}\". Most likely you have forgotten to assign this value before serializing",
                field, expected
            ),
            Self::TypeMismatch { expected, found } => write!(
                f,
                "Value is not an instance of expected type {}. Got: {}",
                expected, found
            ),
            Self::LengthMismatch { expected, found } => write!(
                f,
                "Provided array does not equal fixed array size. Received: {}, Expected: {}",
                found, expected
            ),
            Self::Schema(err) => write!(f, "{}", err),
            Self::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

/// Encoding failure with the path of the offending field.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeError {
    kind: EncodeErrorKind,
    path: FieldPath,
}

impl EncodeError {
    pub fn new(kind: EncodeErrorKind) -> Self {
        Self {
            kind,
            path: FieldPath::default(),
        }
    }

    pub fn custom(msg: impl Into<String>) -> Self {
        Self::new(EncodeErrorKind::Custom(msg.into()))
    }

    pub fn kind(&self) -> &EncodeErrorKind {
        &self.kind
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    #[must_use]
    pub fn at_field(mut self, name: &str) -> Self {
        self.path.prepend(PathSegment::Field(name.to_string()));
        self
    }

    #[must_use]
    pub fn at_index(mut self, index: usize) -> Self {
        self.path.prepend(PathSegment::Index(index));
        self
    }
}

impl From<EncodeErrorKind> for EncodeError {
    fn from(kind: EncodeErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<SchemaError> for EncodeError {
    fn from(err: SchemaError) -> Self {
        Self::new(EncodeErrorKind::Schema(err))
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.path.is_empty() {
            write!(f, ". Error originated at field path: {}", self.path)?;
        }
        Ok(())
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            EncodeErrorKind::Schema(err) => Some(err),
            _ => None,
        }
    }
}

// ============================================================================
// Decode errors
// ============================================================================

/// What went wrong while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Not enough bytes left for a fixed-width read.
    OutOfBounds {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    /// Boolean byte other than 0 or 1.
    InvalidBool { offset: usize, value: u8 },
    NotANumber { offset: usize, kind: &'static str },
    /// Length prefix points past the end of the input.
    InvalidLength {
        offset: usize,
        length: u64,
        remaining: usize,
    },
    InvalidUtf8 { offset: usize },
    /// Discriminator matches none of the known descendants.
    UnknownDiscriminator {
        offset: usize,
        base_type: String,
        discriminator: String,
    },
    /// Input continues after a complete value.
    TrailingBytes { remaining: usize },
    /// Decoded type is unrelated to the requested one.
    TypeMismatch { expected: String, found: String },
    /// Nested struct frames exceed the configured limit.
    NestingTooDeep { limit: usize },
    Schema(SchemaError),
    /// Raised by a user supplied codec.
    Custom(String),
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds {
                offset,
                needed,
                remaining,
            } => write!(
                f,
                "Reached the end of buffer when deserializing: need {} bytes at offset {}, {} remaining",
                needed, offset, remaining
            ),
            Self::InvalidBool { offset, value } => write!(
                f,
                "Unexpected value for boolean at offset {}: {}, expected 0 or 1",
                offset, value
            ),
            Self::NotANumber { offset, kind } => {
                write!(f, "Decoded NaN for {} at offset {}", kind, offset)
            }
            Self::InvalidLength {
                offset,
                length,
                remaining,
            } => write!(
                f,
                "Error decoding length at offset {}: {} bytes announced, {} remaining",
                offset, length, remaining
            ),
            Self::InvalidUtf8 { offset } => write!(f, "Invalid UTF-8 string at offset {}", offset),
            Self::UnknownDiscriminator {
                offset,
                base_type,
                discriminator,
            } => write!(
                f,
                "Failed to find class to deserialize to from {}: no variant matches {} read at offset {}",
                base_type, discriminator, offset
            ),
            Self::TrailingBytes { remaining } => write!(
                f,
                "Unexpected {} bytes after deserialized data. This is most likely due to that you are deserializing into the wrong class",
                remaining
            ),
            Self::TypeMismatch { expected, found } => write!(
                f,
                "Deserialization of {} yielded another class: {} which are not compatible",
                expected, found
            ),
            Self::NestingTooDeep { limit } => {
                write!(f, "Nested struct depth exceeds the limit of {}", limit)
            }
            Self::Schema(err) => write!(f, "{}", err),
            Self::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

/// Decoding failure with the path of the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    kind: DecodeErrorKind,
    path: FieldPath,
}

impl DecodeError {
    pub fn new(kind: DecodeErrorKind) -> Self {
        Self {
            kind,
            path: FieldPath::default(),
        }
    }

    pub fn custom(msg: impl Into<String>) -> Self {
        Self::new(DecodeErrorKind::Custom(msg.into()))
    }

    pub fn kind(&self) -> &DecodeErrorKind {
        &self.kind
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    #[must_use]
    pub fn at_field(mut self, name: &str) -> Self {
        self.path.prepend(PathSegment::Field(name.to_string()));
        self
    }

    #[must_use]
    pub fn at_index(mut self, index: usize) -> Self {
        self.path.prepend(PathSegment::Index(index));
        self
    }
}

impl From<DecodeErrorKind> for DecodeError {
    fn from(kind: DecodeErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<SchemaError> for DecodeError {
    fn from(err: SchemaError) -> Self {
        Self::new(DecodeErrorKind::Schema(err))
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.path.is_empty() {
            write!(f, ". Error originated at field path: {}", self.path)?;
        }
        Ok(())
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            DecodeErrorKind::Schema(err) => Some(err),
            _ => None,
        }
    }
}

// ============================================================================
// Umbrella
// ============================================================================

/// Any codec failure.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecError {
    Schema(SchemaError),
    Encode(EncodeError),
    Decode(DecodeError),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(err) => write!(f, "schema error: {}", err),
            Self::Encode(err) => write!(f, "encode error: {}", err),
            Self::Decode(err) => write!(f, "decode error: {}", err),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Schema(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Decode(err) => Some(err),
        }
    }
}

impl From<SchemaError> for CodecError {
    fn from(err: SchemaError) -> Self {
        Self::Schema(err)
    }
}

impl From<EncodeError> for CodecError {
    fn from(err: EncodeError) -> Self {
        Self::Encode(err)
    }
}

impl From<DecodeError> for CodecError {
    fn from(err: DecodeError) -> Self {
        Self::Decode(err)
    }
}

pub type SchemaResult<T> = Result<T, SchemaError>;
pub type EncodeResult<T> = Result<T, EncodeError>;
pub type DecodeResult<T> = Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_path_prefixes_outward() {
        let err = EncodeError::new(EncodeErrorKind::OutOfRange {
            range: ">= 0 and <= 255".into(),
            value: "256".into(),
        })
        .at_index(2)
        .at_field("values")
        .at_field("inner");

        assert_eq!(err.path().segments().len(), 3);
        assert_eq!(
            err.to_string(),
            "Out of range value: >= 0 and <= 255, 256. Error originated at field path: inner.values[2]"
        );
    }

    #[test]
    fn test_trailing_bytes_message() {
        let err = DecodeError::new(DecodeErrorKind::TrailingBytes { remaining: 3 });
        assert!(err.to_string().starts_with("Unexpected 3 bytes after deserialized data"));
        assert!(err.path().is_empty());
    }

    #[test]
    fn test_codec_error_wraps_sources() {
        let schema = SchemaError::NotRegistered {
            type_name: "Ghost".into(),
        };
        let err: CodecError = DecodeError::from(schema.clone()).into();
        assert!(matches!(
            &err,
            CodecError::Decode(d) if d.kind() == &DecodeErrorKind::Schema(schema.clone())
        ));
        assert_eq!(
            err.to_string(),
            "decode error: Class Ghost is missing in schema"
        );
    }
}
