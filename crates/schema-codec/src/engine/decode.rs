// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Deserialization engine and variant resolution.
//!
//! Decoding a type always starts at the root of its hierarchy, mirroring the
//! encode order. Each type compiles to a [`DecodePlan`] that reads its own
//! level and then decides where to continue:
//!
//! ```text
//!   root plan ──fields──> dispatch ──disc 1──> Circle plan ──fields──> Leaf
//!                             │
//!                             └────disc 2──> Square plan ──fields──> Leaf
//! ```
//!
//! The type where the walk stops is the concrete type of the result.

use super::{DecodeOptions, OutputMode};
use crate::config::CodecConfig;
use crate::core::ser::{BufferReader, PrimitiveKind};
use crate::error::{DecodeError, DecodeErrorKind, DecodeResult, SchemaError, SchemaResult};
use crate::schema::registry::DispatchShape;
use crate::schema::{BytesLayout, Discriminator, SchemaRegistry, TypeDescriptor, TypeName};
use crate::value::{Fields, StructValue, Value};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// State threaded through one decode call.
pub(crate) struct DecodeContext<'r> {
    registry: &'r SchemaRegistry,
    options: DecodeOptions,
    config: Arc<CodecConfig>,
    depth: usize,
}

type FieldDecoder = Box<
    dyn for<'a> Fn(&mut DecodeContext<'_>, &mut BufferReader<'a>) -> DecodeResult<Value<'a>>
        + Send
        + Sync,
>;

fn decoder<F>(f: F) -> FieldDecoder
where
    F: for<'a> Fn(&mut DecodeContext<'_>, &mut BufferReader<'a>) -> DecodeResult<Value<'a>>
        + Send
        + Sync
        + 'static,
{
    Box::new(f)
}

/// Compiled decoder for one level of a hierarchy.
pub(crate) struct DecodePlan {
    type_name: TypeName,
    /// Discriminator of a root level, verified on entry.
    entry: Option<Discriminator>,
    fields: Vec<(Arc<str>, FieldDecoder)>,
    dispatch: DispatchShape,
}

impl fmt::Debug for DecodePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodePlan")
            .field("type_name", &self.type_name)
            .field("entry", &self.entry)
            .field("fields", &self.fields.len())
            .field("dispatch", &self.dispatch)
            .finish()
    }
}

impl DecodePlan {
    pub(crate) fn compile(registry: &SchemaRegistry, type_name: &TypeName) -> SchemaResult<Self> {
        let node = registry.node_or_err(type_name)?;
        let mut entry = None;
        let mut fields = Vec::new();

        if let Some(schema) = node.schema() {
            if node.parent().is_none() {
                entry = schema.discriminator().cloned();
            }
            for (index, slot) in schema.slots().iter().enumerate() {
                let slot = slot.as_ref().ok_or_else(|| SchemaError::IndexGap {
                    type_name: type_name.to_string(),
                    index,
                })?;
                fields.push((slot.key.clone(), compile_field(&slot.descriptor)));
            }
        }
        let dispatch = registry.dispatch_shape(type_name)?;

        log::debug!(
            "[decode] compiled {} ({} fields, dispatch {:?})",
            type_name,
            fields.len(),
            dispatch
        );
        Ok(Self {
            type_name: type_name.clone(),
            entry,
            fields,
            dispatch,
        })
    }

    /// Read this level into `out` and continue below it. Returns the
    /// concrete type.
    fn run<'a>(
        &self,
        ctx: &mut DecodeContext<'_>,
        reader: &mut BufferReader<'a>,
        out: &mut Fields<'a>,
    ) -> DecodeResult<TypeName> {
        if let Some(expected) = &self.entry {
            let offset = reader.offset();
            let found = Discriminator::read(expected.kind(), reader)?;
            if &found != expected {
                return Err(self.unknown_discriminator(offset, &found));
            }
        }

        for (key, decode) in &self.fields {
            let value = decode(ctx, reader).map_err(|e| e.at_field(key))?;
            out.insert(key.to_string(), value);
        }

        let registry = ctx.registry;
        match &self.dispatch {
            DispatchShape::Leaf => Ok(self.type_name.clone()),
            DispatchShape::PassThrough(child) => registry.decode_plan(child)?.run(ctx, reader, out),
            DispatchShape::Keyed { kind, targets } => {
                let offset = reader.offset();
                let found = Discriminator::read(*kind, reader)?;
                let Some((_, child)) = targets.iter().find(|(d, _)| *d == found) else {
                    return Err(self.unknown_discriminator(offset, &found));
                };
                log::trace!(
                    "[decode] {} discriminator {} -> {}",
                    self.type_name,
                    found,
                    child
                );
                registry.decode_plan(child)?.run(ctx, reader, out)
            }
        }
    }

    fn unknown_discriminator(&self, offset: usize, found: &Discriminator) -> DecodeError {
        DecodeError::new(DecodeErrorKind::UnknownDiscriminator {
            offset,
            base_type: self.type_name.to_string(),
            discriminator: found.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Field decoders
// ---------------------------------------------------------------------------

fn compile_field(descriptor: &TypeDescriptor) -> FieldDecoder {
    match descriptor {
        TypeDescriptor::Primitive(kind) => {
            let kind = *kind;
            decoder(move |_, reader| read_primitive(kind, reader))
        }
        TypeDescriptor::String(prefix) => {
            let prefix = *prefix;
            decoder(move |_, reader| Ok(Value::String(Cow::Borrowed(reader.read_string(prefix)?))))
        }
        TypeDescriptor::Bytes(layout) => {
            let layout = *layout;
            decoder(move |_, reader| read_byte_sequence(layout, reader))
        }
        TypeDescriptor::Option(inner) => {
            let inner = compile_field(inner);
            decoder(move |ctx, reader| {
                if reader.read_bool()? {
                    inner(ctx, reader)
                } else {
                    Ok(Value::Null)
                }
            })
        }
        TypeDescriptor::List { element, prefix } if element.is_byte() => {
            let layout = BytesLayout::Prefixed(*prefix);
            decoder(move |_, reader| read_byte_sequence(layout, reader))
        }
        TypeDescriptor::FixedArray { element, len } if element.is_byte() => {
            let layout = BytesLayout::Fixed(*len);
            decoder(move |_, reader| read_byte_sequence(layout, reader))
        }
        TypeDescriptor::List { element, prefix } => {
            let prefix = *prefix;
            let element = compile_field(element);
            decoder(move |ctx, reader| {
                let len = reader.read_length(prefix)?;
                read_elements(ctx, reader, &element, len)
            })
        }
        TypeDescriptor::FixedArray { element, len } => {
            let len = *len as u64;
            let element = compile_field(element);
            decoder(move |ctx, reader| read_elements(ctx, reader, &element, len))
        }
        TypeDescriptor::Struct(declared) => {
            let declared = declared.clone();
            decoder(move |ctx, reader| ctx.decode_nested(&declared, reader))
        }
        TypeDescriptor::Custom(codec) => {
            let codec = Arc::clone(codec);
            decoder(move |_, reader| codec.decode(reader))
        }
    }
}

fn read_elements<'a>(
    ctx: &mut DecodeContext<'_>,
    reader: &mut BufferReader<'a>,
    element: &FieldDecoder,
    len: u64,
) -> DecodeResult<Value<'a>> {
    // Announced lengths are untrusted: never reserve past the configured cap
    // or the bytes left in the input.
    let reserve = usize::try_from(len)
        .unwrap_or(usize::MAX)
        .min(ctx.config.max_prealloc_elements)
        .min(reader.remaining());
    let mut items = Vec::with_capacity(reserve);
    for i in 0..len {
        let item = element(ctx, reader).map_err(|e| e.at_index(i as usize))?;
        items.push(item);
    }
    Ok(Value::List(items))
}

fn read_primitive<'a>(
    kind: PrimitiveKind,
    reader: &mut BufferReader<'a>,
) -> DecodeResult<Value<'a>> {
    Ok(match kind {
        PrimitiveKind::Bool => Value::Bool(reader.read_bool()?),
        PrimitiveKind::U8 => Value::U8(reader.read_u8()?),
        PrimitiveKind::U16 => Value::U16(reader.read_u16()?),
        PrimitiveKind::U32 => Value::U32(reader.read_u32()?),
        PrimitiveKind::U64 => Value::U64(reader.read_u64()?),
        PrimitiveKind::U128 => Value::U128(reader.read_u128()?),
        PrimitiveKind::U256 => Value::U256(reader.read_u256()?),
        PrimitiveKind::U512 => Value::U512(reader.read_u512()?),
        PrimitiveKind::F32 => Value::F32(reader.read_f32()?),
        PrimitiveKind::F64 => Value::F64(reader.read_f64()?),
        PrimitiveKind::String => Value::String(Cow::Borrowed(
            reader.read_string(crate::config::DEFAULT_LENGTH_PREFIX)?,
        )),
    })
}

/// Zero-copy view into the input.
fn read_byte_sequence<'a>(
    layout: BytesLayout,
    reader: &mut BufferReader<'a>,
) -> DecodeResult<Value<'a>> {
    let bytes = match layout {
        BytesLayout::Prefixed(prefix) => reader.read_prefixed_bytes(prefix)?,
        BytesLayout::Fixed(len) => reader.read_bytes(len)?,
    };
    Ok(Value::Bytes(Cow::Borrowed(bytes)))
}

// ---------------------------------------------------------------------------
// Struct assembly
// ---------------------------------------------------------------------------

impl DecodeContext<'_> {
    fn decode_nested<'a>(
        &mut self,
        target: &str,
        reader: &mut BufferReader<'a>,
    ) -> DecodeResult<Value<'a>> {
        let limit = self.config.max_nesting_depth;
        if self.depth >= limit {
            return Err(DecodeErrorKind::NestingTooDeep { limit }.into());
        }
        self.depth += 1;
        let result = self.decode_struct(target, reader);
        self.depth -= 1;
        result
    }

    fn decode_struct<'a>(
        &mut self,
        target: &str,
        reader: &mut BufferReader<'a>,
    ) -> DecodeResult<Value<'a>> {
        let registry = self.registry;
        if !registry.is_resolvable(target)? {
            return Err(SchemaError::NotRegistered {
                type_name: target.to_string(),
            }
            .into());
        }

        let root = registry.root_of(target)?;
        let mut fields = Fields::new();
        let concrete = registry.decode_plan(&root)?.run(self, reader, &mut fields)?;

        let output = self.options.output;
        if !self.options.unchecked
            && output != OutputMode::Plain
            && !registry.is_compatible(&concrete, target)
        {
            return Err(DecodeErrorKind::TypeMismatch {
                expected: target.to_string(),
                found: concrete.to_string(),
            }
            .into());
        }

        Ok(match output {
            OutputMode::Instance => Value::Struct(StructValue::from_fields(concrete, fields)),
            OutputMode::Plain => Value::Record(fields),
            OutputMode::Construct => {
                let mut merged: Fields<'a> = registry.initial_fields(&concrete)?;
                merged.extend(fields);
                Value::Struct(StructValue::from_fields(concrete, merged))
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Registry entry points
// ---------------------------------------------------------------------------

impl SchemaRegistry {
    pub(crate) fn decode_plan(&self, name: &TypeName) -> SchemaResult<Arc<DecodePlan>> {
        self.handlers
            .decoder_or_try_build(name, || DecodePlan::compile(self, name))
    }

    /// Decode one `target` value spanning all of `bytes`.
    ///
    /// Without `unchecked`, leftover input is an error; with it, the
    /// remainder is ignored.
    pub fn decode<'a>(
        &self,
        bytes: &'a [u8],
        target: &str,
        options: DecodeOptions,
    ) -> DecodeResult<Value<'a>> {
        let mut reader = BufferReader::new(bytes);
        let value = self.decode_from(&mut reader, target, options)?;
        let remaining = reader.remaining();
        if remaining > 0 {
            if !options.unchecked {
                return Err(DecodeErrorKind::TrailingBytes { remaining }.into());
            }
            log::debug!(
                "[decode] ignoring {} trailing bytes after {}",
                remaining,
                target
            );
        }
        Ok(value)
    }

    /// Decode one value from the front of `bytes`, returning it with the
    /// number of bytes consumed. Trailing input is never an error.
    pub fn decode_partial<'a>(
        &self,
        bytes: &'a [u8],
        target: &str,
        options: DecodeOptions,
    ) -> DecodeResult<(Value<'a>, usize)> {
        let mut reader = BufferReader::new(bytes);
        let value = self.decode_from(&mut reader, target, options)?;
        Ok((value, reader.offset()))
    }

    /// Decode one value at the reader's position.
    ///
    /// Lets a [`FieldCodec`](crate::schema::FieldCodec) read a registered
    /// type embedded in its own layout.
    pub fn decode_from<'a>(
        &self,
        reader: &mut BufferReader<'a>,
        target: &str,
        options: DecodeOptions,
    ) -> DecodeResult<Value<'a>> {
        let mut ctx = DecodeContext {
            registry: self,
            options,
            config: self.config(),
            depth: 0,
        };
        ctx.decode_nested(target, reader)
    }
}
