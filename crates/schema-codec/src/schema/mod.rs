// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema model: descriptors, discriminators and the type registry.

pub mod builder;
pub mod descriptor;
pub mod discriminator;
pub mod registry;
pub mod validate;

#[cfg(test)]
mod tests;

pub use builder::StructBuilder;
pub use descriptor::{
    BytesLayout, FieldCodec, FieldSlot, FnCodec, MemoizedEncoding, RecursiveEncode, StructCodec,
    TypeDescriptor, TypeName,
};
pub use discriminator::{Discriminator, DiscriminatorKind};
pub use registry::{Initializer, SchemaRegistry, StructSchema, TypeNode};
pub use validate::ValidateOptions;
