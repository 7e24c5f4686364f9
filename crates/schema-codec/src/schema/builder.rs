// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent registration of one level.

use super::descriptor::{StructCodec, TypeDescriptor};
use super::discriminator::Discriminator;
use super::registry::{Initializer, SchemaRegistry};
use crate::error::SchemaResult;
use crate::value::Fields;
use std::sync::Arc;

/// Collects the parts of a level and registers them on [`finish`](Self::finish).
///
/// ```
/// use schema_codec::{SchemaRegistry, TypeDescriptor};
///
/// let mut registry = SchemaRegistry::new();
/// registry.define("Shape").field("id", TypeDescriptor::u32()).finish().unwrap();
/// registry
///     .define("Circle")
///     .extends("Shape")
///     .discriminator(1u8)
///     .field("radius", TypeDescriptor::f64())
///     .finish()
///     .unwrap();
/// registry.validate(&["Shape"]).unwrap();
/// ```
#[must_use = "nothing is registered until finish() is called"]
pub struct StructBuilder<'r> {
    registry: &'r mut SchemaRegistry,
    name: String,
    parent: Option<String>,
    discriminator: Option<Discriminator>,
    fields: Vec<(String, Option<usize>, TypeDescriptor)>,
    codec: Option<Arc<dyn StructCodec>>,
    initializer: Option<Initializer>,
}

impl<'r> StructBuilder<'r> {
    pub(crate) fn new(registry: &'r mut SchemaRegistry, name: &str) -> Self {
        Self {
            registry,
            name: name.to_string(),
            parent: None,
            discriminator: None,
            fields: Vec::new(),
            codec: None,
            initializer: None,
        }
    }

    /// Declare the direct parent type.
    pub fn extends(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn discriminator(mut self, discriminator: impl Into<Discriminator>) -> Self {
        self.discriminator = Some(discriminator.into());
        self
    }

    /// Append a field.
    pub fn field(mut self, key: &str, descriptor: TypeDescriptor) -> Self {
        self.fields.push((key.to_string(), None, descriptor));
        self
    }

    /// Add a field at an explicit position.
    pub fn field_at(mut self, key: &str, index: usize, descriptor: TypeDescriptor) -> Self {
        self.fields.push((key.to_string(), Some(index), descriptor));
        self
    }

    /// Whole-type encode override.
    pub fn codec(mut self, codec: impl StructCodec + 'static) -> Self {
        self.codec = Some(Arc::new(codec));
        self
    }

    pub fn initializer<F>(mut self, init: F) -> Self
    where
        F: Fn() -> Fields<'static> + Send + Sync + 'static,
    {
        self.initializer = Some(Arc::new(init));
        self
    }

    /// Register everything collected so far, stopping at the first error.
    pub fn finish(self) -> SchemaResult<()> {
        let Self {
            registry,
            name,
            parent,
            discriminator,
            fields,
            codec,
            initializer,
        } = self;

        match &parent {
            Some(parent) => registry.declare_subtype(&name, parent)?,
            None => {
                registry.declare(&name);
            }
        }
        for (key, index, descriptor) in fields {
            registry.register_field(&name, &key, index, descriptor)?;
        }
        if let Some(discriminator) = discriminator {
            registry.register_discriminator(&name, discriminator)?;
        }
        if let Some(codec) = codec {
            registry.register_shared_codec(&name, codec)?;
        }
        if let Some(init) = initializer {
            registry.register_shared_initializer(&name, init)?;
        }
        Ok(())
    }
}
