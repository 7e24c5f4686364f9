// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use schema_codec::{DecodeOptions, LengthPrefix, SchemaRegistry, TypeDescriptor};
use std::sync::OnceLock;

/// Recursive hierarchy touching every descriptor kind.
fn registry() -> &'static SchemaRegistry {
    static REGISTRY: OnceLock<SchemaRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry = SchemaRegistry::new();
        registry
            .define("Node")
            .discriminator([0xa5u8])
            .field("flags", TypeDescriptor::bool())
            .finish()
            .expect("Node");
        registry
            .define("Leaf")
            .extends("Node")
            .discriminator(0u8)
            .field("wide", TypeDescriptor::u256())
            .field("ratio", TypeDescriptor::f64())
            .field("label", TypeDescriptor::string_with_prefix(LengthPrefix::U8))
            .finish()
            .expect("Leaf");
        registry
            .define("Branch")
            .extends("Node")
            .discriminator(1u8)
            .field("children", TypeDescriptor::vec(TypeDescriptor::struct_ref("Node")))
            .field("next", TypeDescriptor::option(TypeDescriptor::struct_ref("Node")))
            .field("digest", TypeDescriptor::fixed_array(TypeDescriptor::u8(), 4))
            .finish()
            .expect("Branch");
        registry
            .define("Tagged")
            .extends("Node")
            .discriminator(2u8)
            .field("name", TypeDescriptor::string())
            .field("blob", TypeDescriptor::bytes_with_prefix(LengthPrefix::U16))
            .finish()
            .expect("Tagged");
        registry
    })
}

fuzz_target!(|data: &[u8]| {
    let registry = registry();

    // Fuzz checked decode (trailing bytes rejected)
    let _ = registry.decode(data, "Node", DecodeOptions::default());

    // Fuzz unchecked, plain-output decode
    let _ = registry.decode(data, "Node", DecodeOptions::plain().with_unchecked(true));

    // Fuzz partial decode (stream framing)
    let _ = registry.decode_partial(data, "Node", DecodeOptions::default());
});
