// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field type descriptors and user codec hooks.

use crate::config::DEFAULT_LENGTH_PREFIX;
use crate::core::ser::{BufferReader, BufferWriter, LengthPrefix, PrimitiveKind};
use crate::error::{DecodeResult, EncodeResult};
use crate::value::{StructValue, Value};
use std::fmt;
use std::sync::Arc;

/// Registered type name.
pub type TypeName = Arc<str>;

/// Per-field codec supplied by the caller.
///
/// Custom fields are exempt from the null check: a missing value arrives as
/// [`Value::Null`] and the codec decides how (or whether) to encode absence.
pub trait FieldCodec: Send + Sync {
    fn encode<'v>(&self, value: &'v Value<'_>, writer: &mut BufferWriter<'v>) -> EncodeResult<()>;
    fn decode<'a>(&self, reader: &mut BufferReader<'a>) -> DecodeResult<Value<'a>>;
}

/// [`FieldCodec`] built from a pair of closures.
pub struct FnCodec<E, D> {
    encode: E,
    decode: D,
}

impl<E, D> FnCodec<E, D>
where
    E: for<'v> Fn(&'v Value<'_>, &mut BufferWriter<'v>) -> EncodeResult<()> + Send + Sync,
    D: for<'a> Fn(&mut BufferReader<'a>) -> DecodeResult<Value<'a>> + Send + Sync,
{
    pub fn new(encode: E, decode: D) -> Self {
        Self { encode, decode }
    }
}

impl<E, D> FieldCodec for FnCodec<E, D>
where
    E: for<'v> Fn(&'v Value<'_>, &mut BufferWriter<'v>) -> EncodeResult<()> + Send + Sync,
    D: for<'a> Fn(&mut BufferReader<'a>) -> DecodeResult<Value<'a>> + Send + Sync,
{
    fn encode<'v>(&self, value: &'v Value<'_>, writer: &mut BufferWriter<'v>) -> EncodeResult<()> {
        (self.encode)(value, writer)
    }

    fn decode<'a>(&self, reader: &mut BufferReader<'a>) -> DecodeResult<Value<'a>> {
        (self.decode)(reader)
    }
}

/// Default field emission of the overriding level for a struct value, with
/// whole-type codecs of that value disabled (nested types keep theirs).
pub type RecursiveEncode<'f> = dyn Fn(&StructValue<'_>) -> EncodeResult<Vec<u8>> + 'f;

/// Encode-only replacement for one level's field emission.
///
/// Discriminators are still written by the engine, as are the levels above
/// and below this one; the codec writes whatever stands in for this level's
/// fields. `recurse` produces exactly those default field bytes, which lets
/// an implementation cache and replay them.
pub trait StructCodec: Send + Sync {
    fn encode<'v>(
        &self,
        value: &'v StructValue<'_>,
        writer: &mut BufferWriter<'v>,
        recurse: &RecursiveEncode<'_>,
    ) -> EncodeResult<()>;

    /// Whether the codec stores bytes in the value's memo slot. At most one
    /// level of a chain may use it.
    fn uses_memo(&self) -> bool {
        false
    }
}

/// Whole-type codec that encodes its level once and replays the bytes
/// stored in the instance's memo slot on later calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoizedEncoding;

impl StructCodec for MemoizedEncoding {
    fn encode<'v>(
        &self,
        value: &'v StructValue<'_>,
        writer: &mut BufferWriter<'v>,
        recurse: &RecursiveEncode<'_>,
    ) -> EncodeResult<()> {
        let cached = match value.memo().get() {
            Some(bytes) => bytes,
            None => {
                let fresh: Arc<[u8]> = recurse(value)?.into();
                value.memo().get_or_init(|| fresh)
            }
        };
        writer.write_raw(cached);
        Ok(())
    }

    fn uses_memo(&self) -> bool {
        true
    }
}

/// Byte sequence layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BytesLayout {
    Prefixed(LengthPrefix),
    Fixed(usize),
}

/// How one field is laid out on the wire.
#[derive(Clone)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    Bytes(BytesLayout),
    Option(Box<TypeDescriptor>),
    List {
        element: Box<TypeDescriptor>,
        prefix: LengthPrefix,
    },
    FixedArray {
        element: Box<TypeDescriptor>,
        len: usize,
    },
    String(LengthPrefix),
    /// Nested registered type, encoded through its own schema.
    Struct(TypeName),
    Custom(Arc<dyn FieldCodec>),
}

impl TypeDescriptor {
    pub fn bool() -> Self {
        Self::Primitive(PrimitiveKind::Bool)
    }

    pub fn u8() -> Self {
        Self::Primitive(PrimitiveKind::U8)
    }

    pub fn u16() -> Self {
        Self::Primitive(PrimitiveKind::U16)
    }

    pub fn u32() -> Self {
        Self::Primitive(PrimitiveKind::U32)
    }

    pub fn u64() -> Self {
        Self::Primitive(PrimitiveKind::U64)
    }

    pub fn u128() -> Self {
        Self::Primitive(PrimitiveKind::U128)
    }

    pub fn u256() -> Self {
        Self::Primitive(PrimitiveKind::U256)
    }

    pub fn u512() -> Self {
        Self::Primitive(PrimitiveKind::U512)
    }

    pub fn f32() -> Self {
        Self::Primitive(PrimitiveKind::F32)
    }

    pub fn f64() -> Self {
        Self::Primitive(PrimitiveKind::F64)
    }

    pub fn string() -> Self {
        Self::String(DEFAULT_LENGTH_PREFIX)
    }

    pub fn string_with_prefix(prefix: LengthPrefix) -> Self {
        Self::String(prefix)
    }

    pub fn bytes() -> Self {
        Self::Bytes(BytesLayout::Prefixed(DEFAULT_LENGTH_PREFIX))
    }

    pub fn bytes_with_prefix(prefix: LengthPrefix) -> Self {
        Self::Bytes(BytesLayout::Prefixed(prefix))
    }

    pub fn fixed_bytes(len: usize) -> Self {
        Self::Bytes(BytesLayout::Fixed(len))
    }

    pub fn option(inner: TypeDescriptor) -> Self {
        Self::Option(Box::new(inner))
    }

    pub fn vec(element: TypeDescriptor) -> Self {
        Self::vec_with_prefix(element, DEFAULT_LENGTH_PREFIX)
    }

    pub fn vec_with_prefix(element: TypeDescriptor, prefix: LengthPrefix) -> Self {
        Self::List {
            element: Box::new(element),
            prefix,
        }
    }

    pub fn fixed_array(element: TypeDescriptor, len: usize) -> Self {
        Self::FixedArray {
            element: Box::new(element),
            len,
        }
    }

    pub fn struct_ref(name: &str) -> Self {
        Self::Struct(Arc::from(name))
    }

    pub fn custom(codec: impl FieldCodec + 'static) -> Self {
        Self::Custom(Arc::new(codec))
    }

    /// Whether a null value must be rejected before encoding.
    pub fn is_required(&self) -> bool {
        !matches!(self, Self::Option(_) | Self::Custom(_))
    }

    /// `u8` elements turn lists and fixed arrays into byte sequences.
    pub(crate) fn is_byte(&self) -> bool {
        matches!(self, Self::Primitive(PrimitiveKind::U8))
    }

    /// Nested type names referenced by this descriptor, depth first.
    pub fn struct_refs(&self) -> Vec<&TypeName> {
        let mut out = Vec::new();
        self.collect_refs(&mut out);
        out
    }

    fn collect_refs<'s>(&'s self, out: &mut Vec<&'s TypeName>) {
        match self {
            Self::Struct(name) => out.push(name),
            Self::Option(inner) => inner.collect_refs(out),
            Self::List { element, .. } | Self::FixedArray { element, .. } => {
                element.collect_refs(out);
            }
            Self::Primitive(_) | Self::Bytes(_) | Self::String(_) | Self::Custom(_) => {}
        }
    }
}

impl From<PrimitiveKind> for TypeDescriptor {
    fn from(kind: PrimitiveKind) -> Self {
        Self::Primitive(kind)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => write!(f, "{}", kind),
            Self::Bytes(BytesLayout::Prefixed(_)) => write!(f, "bytes"),
            Self::Bytes(BytesLayout::Fixed(len)) => write!(f, "fixed_bytes({})", len),
            Self::Option(inner) => write!(f, "option({})", inner),
            Self::List { element, .. } => write!(f, "vec({})", element),
            Self::FixedArray { element, len } => write!(f, "fixed_array({}, {})", element, len),
            Self::String(_) => write!(f, "string"),
            Self::Struct(name) => write!(f, "{}", name),
            Self::Custom(_) => write!(f, "custom"),
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List { element, prefix } => f
                .debug_struct("List")
                .field("element", element)
                .field("prefix", prefix)
                .finish(),
            Self::String(prefix) => f.debug_tuple("String").field(prefix).finish(),
            Self::Bytes(layout) => f.debug_tuple("Bytes").field(layout).finish(),
            other => write!(f, "{}", other),
        }
    }
}

/// One declared field of a level.
#[derive(Debug, Clone)]
pub struct FieldSlot {
    pub key: Arc<str>,
    /// Explicit position, when one was requested.
    pub index: Option<usize>,
    pub descriptor: TypeDescriptor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_labels() {
        assert_eq!(TypeDescriptor::u64().to_string(), "u64");
        assert_eq!(
            TypeDescriptor::option(TypeDescriptor::vec(TypeDescriptor::string())).to_string(),
            "option(vec(string))"
        );
        assert_eq!(
            TypeDescriptor::fixed_array(TypeDescriptor::u8(), 3).to_string(),
            "fixed_array(u8, 3)"
        );
        assert_eq!(TypeDescriptor::struct_ref("Inner").to_string(), "Inner");
    }

    #[test]
    fn test_required_and_refs() {
        assert!(TypeDescriptor::u8().is_required());
        assert!(!TypeDescriptor::option(TypeDescriptor::u8()).is_required());

        let nested = TypeDescriptor::option(TypeDescriptor::vec(TypeDescriptor::fixed_array(
            TypeDescriptor::struct_ref("Leaf"),
            2,
        )));
        let refs: Vec<&str> = nested.struct_refs().into_iter().map(|n| &**n).collect();
        assert_eq!(refs, vec!["Leaf"]);
        assert!(TypeDescriptor::bytes().struct_refs().is_empty());
    }

    #[test]
    fn test_fn_codec_round_trip() {
        let codec = FnCodec::new(
            |value, writer| {
                let n = value.as_u64().unwrap_or(0);
                writer.write_u16(n as u16);
                Ok(())
            },
            |reader| Ok(Value::U16(reader.read_u16()?)),
        );
        let value = Value::U64(3);
        let mut writer = BufferWriter::new();
        codec.encode(&value, &mut writer).expect("encode");
        let bytes = writer.finalize();
        assert_eq!(bytes, vec![3, 0]);

        let mut reader = BufferReader::new(&bytes);
        assert_eq!(codec.decode(&mut reader).expect("decode"), Value::U16(3));
    }
}
