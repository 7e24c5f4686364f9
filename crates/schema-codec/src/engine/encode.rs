// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serialization engine.
//!
//! A concrete type compiles to one [`EncodePlan`]: the steps of every level
//! of its chain, root first. Per level the discriminator (if any) comes
//! first, then either the level's whole-type codec or its fields in slot
//! order. An override receives the level's default field emission through
//! its recurse callback. Field steps are closures picked once per descriptor, so a cached
//! plan runs without looking at the schema again. Struct-typed fields are
//! late bound: the plan of the value's concrete type is fetched when the
//! field is written.

use super::EncodeOptions;
use crate::core::ser::{out_of_range, BufferWriter, PrimitiveKind};
use crate::error::{EncodeError, EncodeErrorKind, EncodeResult, SchemaError, SchemaResult};
use crate::schema::{
    BytesLayout, RecursiveEncode, SchemaRegistry, StructCodec, TypeDescriptor, TypeName,
};
use crate::value::{StructValue, Value};
use std::fmt;
use std::sync::Arc;

static NULL: Value<'static> = Value::Null;

/// Cache key component: which checks run and whether overrides apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct EncodeMode {
    /// Struct-typed fields must hold a compatible type.
    pub checked: bool,
    /// Whole-type codecs replace field emission.
    pub overrides: bool,
}

impl EncodeMode {
    pub(crate) const ALL: [EncodeMode; 4] = [
        EncodeMode {
            checked: true,
            overrides: true,
        },
        EncodeMode {
            checked: true,
            overrides: false,
        },
        EncodeMode {
            checked: false,
            overrides: true,
        },
        EncodeMode {
            checked: false,
            overrides: false,
        },
    ];
}

pub(crate) struct EncodeContext<'r> {
    registry: &'r SchemaRegistry,
    checked: bool,
}

type FieldEncoder = Box<
    dyn for<'v> Fn(&EncodeContext<'_>, &'v Value<'_>, &mut BufferWriter<'v>) -> EncodeResult<()>
        + Send
        + Sync,
>;

fn encoder<F>(f: F) -> FieldEncoder
where
    F: for<'v> Fn(&EncodeContext<'_>, &'v Value<'_>, &mut BufferWriter<'v>) -> EncodeResult<()>
        + Send
        + Sync
        + 'static,
{
    Box::new(f)
}

enum EncodeStep {
    Discriminator(Arc<[u8]>),
    Field {
        key: Arc<str>,
        required: bool,
        /// Descriptor label for missing-field errors.
        label: String,
        encode: FieldEncoder,
    },
    Override(Arc<dyn StructCodec>),
}

/// Compiled encoder for one concrete type in one [`EncodeMode`].
pub(crate) struct EncodePlan {
    type_name: TypeName,
    /// Steps tagged with the chain position of their level, root first.
    steps: Vec<(usize, EncodeStep)>,
}

impl fmt::Debug for EncodePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodePlan")
            .field("type_name", &self.type_name)
            .field("steps", &self.steps.len())
            .finish()
    }
}

impl EncodePlan {
    pub(crate) fn compile(
        registry: &SchemaRegistry,
        type_name: &TypeName,
        mode: EncodeMode,
    ) -> SchemaResult<Self> {
        let mut steps = Vec::new();
        let mut registered = false;
        let mut memoized: Option<&TypeName> = None;

        for (level, node) in registry.chain(type_name)?.into_iter().enumerate() {
            let Some(schema) = node.schema() else {
                continue;
            };
            registered = true;

            if let Some(discriminator) = schema.discriminator() {
                steps.push((level, EncodeStep::Discriminator(discriminator.to_bytes().into())));
            }
            match schema.codec() {
                Some(codec) if mode.overrides => {
                    // A value has a single memo slot.
                    if codec.uses_memo() {
                        if let Some(first) = memoized {
                            return Err(SchemaError::MemoConflict {
                                type_name: type_name.to_string(),
                                first: first.to_string(),
                                second: node.name().to_string(),
                            });
                        }
                        memoized = Some(node.name());
                    }
                    steps.push((level, EncodeStep::Override(Arc::clone(codec))));
                }
                _ => {
                    for (index, slot) in schema.slots().iter().enumerate() {
                        let slot = slot.as_ref().ok_or_else(|| SchemaError::IndexGap {
                            type_name: node.name().to_string(),
                            index,
                        })?;
                        let step = EncodeStep::Field {
                            key: slot.key.clone(),
                            required: slot.descriptor.is_required(),
                            label: slot.descriptor.to_string(),
                            encode: compile_field(&slot.descriptor),
                        };
                        steps.push((level, step));
                    }
                }
            }
        }

        if !registered {
            return Err(SchemaError::NotRegistered {
                type_name: type_name.to_string(),
            });
        }
        log::debug!(
            "[encode] compiled {} ({} steps, checked={}, overrides={})",
            type_name,
            steps.len(),
            mode.checked,
            mode.overrides
        );
        Ok(Self {
            type_name: type_name.clone(),
            steps,
        })
    }

    fn run<'v>(
        &self,
        ctx: &EncodeContext<'_>,
        value: &'v StructValue<'_>,
        writer: &mut BufferWriter<'v>,
    ) -> EncodeResult<()> {
        for (level, step) in &self.steps {
            match step {
                EncodeStep::Discriminator(bytes) => writer.write_shared(Arc::clone(bytes)),
                EncodeStep::Field {
                    key,
                    required,
                    label,
                    encode,
                } => write_field(ctx, value, writer, key, *required, label, encode)?,
                EncodeStep::Override(codec) => {
                    let mode = EncodeMode {
                        checked: ctx.checked,
                        overrides: false,
                    };
                    let level = *level;
                    let recurse: &RecursiveEncode<'_> =
                        &|inner| ctx.registry.encode_level_bytes(inner, mode, level);
                    codec.encode(value, writer, recurse)?;
                }
            }
        }
        Ok(())
    }

    /// Field steps of one level only: what an override at that level
    /// stands in for.
    fn run_level<'v>(
        &self,
        ctx: &EncodeContext<'_>,
        value: &'v StructValue<'_>,
        writer: &mut BufferWriter<'v>,
        level: usize,
    ) -> EncodeResult<()> {
        for (_, step) in self.steps.iter().filter(|(l, _)| *l == level) {
            if let EncodeStep::Field {
                key,
                required,
                label,
                encode,
            } = step
            {
                write_field(ctx, value, writer, key, *required, label, encode)?;
            }
        }
        Ok(())
    }
}

fn write_field<'v>(
    ctx: &EncodeContext<'_>,
    value: &'v StructValue<'_>,
    writer: &mut BufferWriter<'v>,
    key: &Arc<str>,
    required: bool,
    label: &str,
    encode: &FieldEncoder,
) -> EncodeResult<()> {
    let field = value.get(key).unwrap_or(&NULL);
    if required && field.is_null() {
        return Err(EncodeError::new(EncodeErrorKind::MissingField {
            field: key.to_string(),
            expected: label.to_string(),
        })
        .at_field(key));
    }
    encode(ctx, field, writer).map_err(|e| e.at_field(key))
}

// ---------------------------------------------------------------------------
// Field encoders
// ---------------------------------------------------------------------------

fn mismatch(expected: impl fmt::Display, found: &Value<'_>) -> EncodeError {
    EncodeError::new(EncodeErrorKind::TypeMismatch {
        expected: expected.to_string(),
        found: found.type_label(),
    })
}

fn compile_field(descriptor: &TypeDescriptor) -> FieldEncoder {
    match descriptor {
        TypeDescriptor::Primitive(kind) => {
            let kind = *kind;
            encoder(move |_, value, writer| write_primitive(kind, value, writer))
        }
        TypeDescriptor::String(prefix) => {
            let prefix = *prefix;
            encoder(move |_, value, writer| match value {
                Value::String(s) => writer.write_string(s, prefix),
                other => Err(mismatch("string", other)),
            })
        }
        TypeDescriptor::Bytes(layout) => {
            let layout = *layout;
            encoder(move |_, value, writer| write_byte_sequence(layout, value, writer))
        }
        TypeDescriptor::Option(inner) => {
            let inner = compile_field(inner);
            encoder(move |ctx, value, writer| {
                if value.is_null() {
                    writer.write_u8(0);
                    return Ok(());
                }
                writer.write_u8(1);
                inner(ctx, value, writer)
            })
        }
        TypeDescriptor::List { element, prefix } if element.is_byte() => {
            let layout = BytesLayout::Prefixed(*prefix);
            encoder(move |_, value, writer| write_byte_sequence(layout, value, writer))
        }
        TypeDescriptor::FixedArray { element, len } if element.is_byte() => {
            let layout = BytesLayout::Fixed(*len);
            encoder(move |_, value, writer| write_byte_sequence(layout, value, writer))
        }
        TypeDescriptor::List { element, prefix } => {
            let prefix = *prefix;
            let label = descriptor.to_string();
            let element = ElementEncoder::new(element);
            encoder(move |ctx, value, writer| {
                let items = value.as_list().ok_or_else(|| mismatch(&label, value))?;
                writer.write_length(prefix, items.len())?;
                element.write_all(ctx, items, writer)
            })
        }
        TypeDescriptor::FixedArray { element, len } => {
            let len = *len;
            let label = descriptor.to_string();
            let element = ElementEncoder::new(element);
            encoder(move |ctx, value, writer| {
                let items = value.as_list().ok_or_else(|| mismatch(&label, value))?;
                if items.len() != len {
                    return Err(EncodeErrorKind::LengthMismatch {
                        expected: len,
                        found: items.len(),
                    }
                    .into());
                }
                element.write_all(ctx, items, writer)
            })
        }
        TypeDescriptor::Struct(declared) => {
            let declared = declared.clone();
            encoder(move |ctx, value, writer| {
                ctx.registry
                    .write_nested(&declared, value, writer, ctx.checked)
            })
        }
        TypeDescriptor::Custom(codec) => {
            let codec = Arc::clone(codec);
            encoder(move |_, value, writer| codec.encode(value, writer))
        }
    }
}

/// Elements of a list or fixed array.
struct ElementEncoder {
    required: bool,
    label: String,
    encode: FieldEncoder,
}

impl ElementEncoder {
    fn new(element: &TypeDescriptor) -> Self {
        Self {
            required: element.is_required(),
            label: element.to_string(),
            encode: compile_field(element),
        }
    }

    fn write_all<'v>(
        &self,
        ctx: &EncodeContext<'_>,
        items: &'v [Value<'_>],
        writer: &mut BufferWriter<'v>,
    ) -> EncodeResult<()> {
        for (i, item) in items.iter().enumerate() {
            if self.required && item.is_null() {
                return Err(mismatch(&self.label, item).at_index(i));
            }
            (self.encode)(ctx, item, writer).map_err(|e| e.at_index(i))?;
        }
        Ok(())
    }
}

fn write_primitive<'v>(
    kind: PrimitiveKind,
    value: &'v Value<'_>,
    writer: &mut BufferWriter<'v>,
) -> EncodeResult<()> {
    match kind {
        PrimitiveKind::Bool => match value {
            Value::Bool(b) => {
                writer.write_bool(*b);
                Ok(())
            }
            other => Err(mismatch(kind, other)),
        },
        PrimitiveKind::F32 => match value {
            Value::F32(v) => writer.write_f32(*v),
            other => Err(mismatch(kind, other)),
        },
        PrimitiveKind::F64 => match value.as_f64() {
            Some(v) => writer.write_f64(v),
            None => Err(mismatch(kind, value)),
        },
        PrimitiveKind::String => match value {
            Value::String(s) => writer.write_string(s, crate::config::DEFAULT_LENGTH_PREFIX),
            other => Err(mismatch(kind, other)),
        },
        _ => {
            let width = kind.width().unwrap_or(0);
            let wide = value.as_wide().ok_or_else(|| mismatch(kind, value))?;
            writer.write_uint(width, &wide)
        }
    }
}

/// `bytes`, `vec(u8)` and `fixed_array(u8, n)`: accepts `Bytes` or a list of
/// integers that each fit a byte.
fn write_byte_sequence<'v>(
    layout: BytesLayout,
    value: &'v Value<'_>,
    writer: &mut BufferWriter<'v>,
) -> EncodeResult<()> {
    match value {
        Value::Bytes(bytes) => {
            write_layout(layout, writer, bytes.len())?;
            writer.write_raw(bytes);
            Ok(())
        }
        Value::List(items) => {
            let mut data = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let wide = item
                    .as_wide()
                    .ok_or_else(|| mismatch(PrimitiveKind::U8, item).at_index(i))?;
                if wide.bits() > 8 {
                    return Err(EncodeError::new(out_of_range(1, wide)).at_index(i));
                }
                data.push(wide.limbs()[0] as u8);
            }
            write_layout(layout, writer, data.len())?;
            writer.write_owned(data);
            Ok(())
        }
        other => Err(mismatch("bytes", other)),
    }
}

/// Length prefix, or the fixed-length check.
fn write_layout(
    layout: BytesLayout,
    writer: &mut BufferWriter<'_>,
    len: usize,
) -> EncodeResult<()> {
    match layout {
        BytesLayout::Prefixed(prefix) => writer.write_length(prefix, len),
        BytesLayout::Fixed(expected) if expected == len => Ok(()),
        BytesLayout::Fixed(expected) => Err(EncodeErrorKind::LengthMismatch {
            expected,
            found: len,
        }
        .into()),
    }
}

// ---------------------------------------------------------------------------
// Registry entry points
// ---------------------------------------------------------------------------

impl SchemaRegistry {
    /// Encode a struct value with every check enabled.
    pub fn encode(&self, value: &Value<'_>) -> EncodeResult<Vec<u8>> {
        self.encode_with(value, EncodeOptions::default())
    }

    pub fn encode_with(&self, value: &Value<'_>, options: EncodeOptions) -> EncodeResult<Vec<u8>> {
        match value {
            Value::Struct(inner) => self.encode_struct_bytes(
                inner,
                EncodeMode {
                    checked: !options.unchecked,
                    overrides: true,
                },
            ),
            other => Err(mismatch("struct", other)),
        }
    }

    pub fn encode_struct(&self, value: &StructValue<'_>) -> EncodeResult<Vec<u8>> {
        self.encode_struct_bytes(
            value,
            EncodeMode {
                checked: true,
                overrides: true,
            },
        )
    }

    /// Append the encoding of `value` to an existing writer.
    ///
    /// Lets a [`FieldCodec`](crate::schema::FieldCodec) embed a registered
    /// type inside its own layout.
    pub fn encode_into<'v>(
        &self,
        value: &'v StructValue<'_>,
        writer: &mut BufferWriter<'v>,
    ) -> EncodeResult<()> {
        self.write_struct(
            value,
            writer,
            EncodeMode {
                checked: true,
                overrides: true,
            },
        )
    }

    pub(crate) fn encode_struct_bytes(
        &self,
        value: &StructValue<'_>,
        mode: EncodeMode,
    ) -> EncodeResult<Vec<u8>> {
        let mut writer = BufferWriter::new();
        self.write_struct(value, &mut writer, mode)?;
        Ok(writer.finalize())
    }

    /// Default field emission of one level of `value`'s chain.
    pub(crate) fn encode_level_bytes(
        &self,
        value: &StructValue<'_>,
        mode: EncodeMode,
        level: usize,
    ) -> EncodeResult<Vec<u8>> {
        let name = value.type_name_arc();
        let plan = self
            .handlers
            .encoder_or_try_build(name, mode, || EncodePlan::compile(self, name, mode))?;
        let ctx = EncodeContext {
            registry: self,
            checked: mode.checked,
        };
        let mut writer = BufferWriter::new();
        plan.run_level(&ctx, value, &mut writer, level)?;
        Ok(writer.finalize())
    }

    fn write_struct<'v>(
        &self,
        value: &'v StructValue<'_>,
        writer: &mut BufferWriter<'v>,
        mode: EncodeMode,
    ) -> EncodeResult<()> {
        let name = value.type_name_arc();
        let plan = self
            .handlers
            .encoder_or_try_build(name, mode, || EncodePlan::compile(self, name, mode))?;
        let ctx = EncodeContext {
            registry: self,
            checked: mode.checked,
        };
        plan.run(&ctx, value, writer)
    }

    fn write_nested<'v>(
        &self,
        declared: &str,
        value: &'v Value<'_>,
        writer: &mut BufferWriter<'v>,
        checked: bool,
    ) -> EncodeResult<()> {
        let Value::Struct(inner) = value else {
            return Err(mismatch(declared, value));
        };
        if checked && !self.is_compatible(inner.type_name(), declared) {
            return Err(mismatch(declared, value));
        }
        self.write_struct(
            inner,
            writer,
            EncodeMode {
                checked,
                overrides: true,
            },
        )
    }
}
