// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use schema_codec::{DecodeOptions, SchemaRegistry, TypeDescriptor};
use std::sync::OnceLock;

fn registry() -> &'static SchemaRegistry {
    static REGISTRY: OnceLock<SchemaRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry = SchemaRegistry::new();
        registry.declare("Shape");
        registry
            .define("Circle")
            .extends("Shape")
            .discriminator("circle")
            .field("radius", TypeDescriptor::u32())
            .finish()
            .expect("Circle");
        registry
            .define("Polygon")
            .extends("Shape")
            .discriminator("polygon")
            .field(
                "points",
                TypeDescriptor::vec(TypeDescriptor::fixed_array(TypeDescriptor::u16(), 2)),
            )
            .field("closed", TypeDescriptor::option(TypeDescriptor::bool()))
            .finish()
            .expect("Polygon");
        registry
    })
}

fuzz_target!(|data: &[u8]| {
    let registry = registry();

    // Anything that decodes must re-encode to the exact same bytes
    if let Ok(value) = registry.decode(data, "Shape", DecodeOptions::default()) {
        let encoded = registry.encode(&value).expect("decoded value must re-encode");
        assert_eq!(encoded, data);
    }
});
