// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// End-to-end protocol built on a type hierarchy: a discriminated message
// family, framing with partial decodes, type-tag prefixes and a custom field
// that embeds types from a second registry.

use schema_codec::{
    BufferReader, DecodeErrorKind, DecodeOptions, FnCodec, SchemaRegistry, StructValue,
    TypeDescriptor, Value,
};
use std::sync::Arc;

/// Message([0x4d, 0x01]) {seq: u32}
///   Request(0) {method: string, args: vec(string)}
///   Response(1) {ok: bool}
///     Data("data") {body: bytes}
///     Empty("empty")
///   Control(2)            (trivial intermediate level)
///     Ping(3) {nonce: u64}
fn protocol() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry
        .define("Message")
        .discriminator([0x4du8, 0x01])
        .field("seq", TypeDescriptor::u32())
        .finish()
        .expect("Message");
    registry
        .define("Request")
        .extends("Message")
        .discriminator(0u8)
        .field("method", TypeDescriptor::string())
        .field("args", TypeDescriptor::vec(TypeDescriptor::string()))
        .finish()
        .expect("Request");
    registry
        .define("Response")
        .extends("Message")
        .discriminator(1u8)
        .field("ok", TypeDescriptor::bool())
        .finish()
        .expect("Response");
    registry
        .define("Data")
        .extends("Response")
        .discriminator("data")
        .field("body", TypeDescriptor::bytes())
        .finish()
        .expect("Data");
    registry
        .define("Empty")
        .extends("Response")
        .discriminator("empty")
        .finish()
        .expect("Empty");
    registry
        .declare_subtype("Control", "Message")
        .expect("Control");
    registry
        .define("Ping")
        .extends("Control")
        .discriminator(3u8)
        .field("nonce", TypeDescriptor::u64())
        .finish()
        .expect("Ping");
    registry.validate(&["Message"]).expect("protocol is valid");
    registry
}

fn request(seq: u32, method: &str) -> StructValue<'_> {
    StructValue::new("Request")
        .with("seq", seq)
        .with("method", method)
        .with("args", Value::list(["a", "b"]))
}

#[test]
fn test_message_layout() {
    let registry = protocol();
    let bytes = registry
        .encode(&Value::Struct(request(7, "get")))
        .expect("encode");

    let mut expected = vec![0x4d, 0x01, 7, 0, 0, 0, 0];
    expected.extend_from_slice(&[3, 0, 0, 0, b'g', b'e', b't']);
    expected.extend_from_slice(&[2, 0, 0, 0, 1, 0, 0, 0, b'a', 1, 0, 0, 0, b'b']);
    assert_eq!(bytes, expected);
}

#[test]
fn test_decode_resolves_every_variant() {
    let registry = protocol();
    let messages = vec![
        request(1, "list"),
        StructValue::new("Data")
            .with("seq", 2u32)
            .with("ok", true)
            .with("body", vec![1u8, 2, 3]),
        StructValue::new("Empty").with("seq", 3u32).with("ok", false),
        StructValue::new("Ping").with("seq", 4u32).with("nonce", u64::MAX),
    ];

    for message in messages {
        let bytes = registry
            .encode(&Value::Struct(message.clone()))
            .expect("encode");
        let decoded = registry
            .decode(&bytes, "Message", DecodeOptions::default())
            .expect("decode");
        assert_eq!(decoded, Value::Struct(message));
    }
}

#[test]
fn test_decode_against_intermediate_levels() {
    let registry = protocol();
    let data = StructValue::new("Data")
        .with("seq", 9u32)
        .with("ok", true)
        .with("body", vec![0xaau8]);
    let bytes = registry
        .encode(&Value::Struct(data.clone()))
        .expect("encode");

    for target in ["Message", "Response", "Data"] {
        let decoded = registry
            .decode(&bytes, target, DecodeOptions::default())
            .expect("compatible target");
        assert_eq!(decoded, Value::Struct(data.clone()));
    }
    for target in ["Request", "Empty", "Control", "Ping"] {
        let err = registry
            .decode(&bytes, target, DecodeOptions::default())
            .expect_err("incompatible target");
        assert!(matches!(err.kind(), DecodeErrorKind::TypeMismatch { .. }));
    }
}

#[test]
fn test_unknown_variants() {
    let registry = protocol();

    // Wrong magic.
    let err = registry
        .decode(&[0x4d, 0x02, 0, 0, 0, 0, 0], "Message", DecodeOptions::default())
        .expect_err("bad magic");
    assert!(matches!(
        err.kind(),
        DecodeErrorKind::UnknownDiscriminator { offset: 0, .. }
    ));

    // Known magic, unknown message kind after the header.
    let err = registry
        .decode(&[0x4d, 0x01, 0, 0, 0, 0, 9], "Message", DecodeOptions::default())
        .expect_err("bad kind");
    assert!(matches!(
        err.kind(),
        DecodeErrorKind::UnknownDiscriminator { offset: 6, base_type, .. } if base_type == "Message"
    ));
}

#[test]
fn test_type_tags() {
    let mut registry = SchemaRegistry::new();
    registry
        .define("Event")
        .discriminator([0xeeu8])
        .finish()
        .expect("Event");
    registry.declare_subtype("Lifecycle", "Event").expect("Lifecycle");
    registry
        .define("Started")
        .extends("Lifecycle")
        .discriminator(1u8)
        .field("at", TypeDescriptor::u64())
        .finish()
        .expect("Started");
    registry
        .define("Stopped")
        .extends("Lifecycle")
        .discriminator(2u8)
        .field("code", TypeDescriptor::u8())
        .finish()
        .expect("Stopped");

    let started = registry.discriminator_prefix("Started").expect("tag");
    let stopped = registry.discriminator_prefix("Stopped").expect("tag");
    assert_eq!(started, vec![0xee, 1]);
    assert_eq!(stopped, vec![0xee, 2]);

    let bytes = registry
        .encode(&Value::Struct(StructValue::new("Stopped").with("code", 4u8)))
        .expect("encode");
    assert!(bytes.starts_with(&stopped));

    // Message has fields above its variants, so its variants have no tag.
    let protocol = protocol();
    assert!(protocol.discriminator_prefix("Ping").is_err());
    assert_eq!(
        protocol.discriminator_prefix("Message").expect("root tag"),
        vec![0x4d, 0x01]
    );
}

#[test]
fn test_stream_of_messages() {
    let registry = protocol();
    let mut stream = Vec::new();
    for seq in 0..5u32 {
        let message = if seq % 2 == 0 {
            request(seq, "tick")
        } else {
            StructValue::new("Empty").with("seq", seq).with("ok", true)
        };
        stream.extend(
            registry
                .encode(&Value::Struct(message))
                .expect("encode"),
        );
    }

    let mut offset = 0;
    let mut seqs = Vec::new();
    while offset < stream.len() {
        let (value, consumed) = registry
            .decode_partial(&stream[offset..], "Message", DecodeOptions::default())
            .expect("frame");
        let message = value.as_struct().expect("struct");
        seqs.push(message.get_as::<u32>("seq").expect("seq"));
        offset += consumed;
    }
    assert_eq!(seqs, vec![0, 1, 2, 3, 4]);

    // Whole-buffer decode refuses the concatenation.
    assert!(matches!(
        registry
            .decode(&stream, "Message", DecodeOptions::default())
            .map_err(|e| e.kind().clone()),
        Err(DecodeErrorKind::TrailingBytes { .. })
    ));
}

#[test]
fn test_reader_framing() {
    let registry = protocol();
    let ping = StructValue::new("Ping").with("seq", 1u32).with("nonce", 42u64);
    let body = registry
        .encode(&Value::Struct(ping.clone()))
        .expect("encode");

    let mut framed = vec![body.len() as u8];
    framed.extend_from_slice(&body);
    framed.push(0xff);

    let mut reader = BufferReader::new(&framed);
    let len = reader.read_u8().expect("frame length");
    let decoded = registry
        .decode_from(&mut reader, "Message", DecodeOptions::default())
        .expect("decode");
    assert_eq!(reader.offset(), 1 + usize::from(len));
    assert_eq!(decoded, Value::Struct(ping));
    assert_eq!(reader.read_u8().expect("trailer"), 0xff);
}

#[test]
fn test_field_embedding_another_registry() {
    let mut inner = SchemaRegistry::new();
    inner
        .define("Point")
        .field("x", TypeDescriptor::u16())
        .field("y", TypeDescriptor::u16())
        .finish()
        .expect("Point");
    let inner = Arc::new(inner);

    let encode_with = Arc::clone(&inner);
    let decode_with = Arc::clone(&inner);
    let mut outer = SchemaRegistry::new();
    outer
        .define("Shape")
        .field("label", TypeDescriptor::string())
        .field(
            "origin",
            TypeDescriptor::custom(FnCodec::new(
                move |value, writer| {
                    let point = value.as_struct().ok_or_else(|| {
                        schema_codec::EncodeError::custom("origin must be a Point")
                    })?;
                    encode_with.encode_into(point, writer)
                },
                move |reader| decode_with.decode_from(reader, "Point", DecodeOptions::default()),
            )),
        )
        .finish()
        .expect("Shape");

    let shape = StructValue::new("Shape").with("label", "dot").with(
        "origin",
        StructValue::new("Point").with("x", 1u16).with("y", 2u16),
    );
    let bytes = outer
        .encode(&Value::Struct(shape.clone()))
        .expect("encode");
    assert_eq!(bytes, vec![3, 0, 0, 0, b'd', b'o', b't', 1, 0, 2, 0]);
    assert_eq!(
        outer
            .decode(&bytes, "Shape", DecodeOptions::default())
            .expect("decode"),
        Value::Struct(shape)
    );

    let bad = StructValue::new("Shape").with("label", "dot").with("origin", 5u8);
    let err = outer
        .encode(&Value::Struct(bad))
        .expect_err("not a struct");
    assert_eq!(
        err.to_string(),
        "origin must be a Point. Error originated at field path: origin"
    );
}

#[test]
fn test_construct_mode_defaults() {
    let mut registry = protocol();
    registry
        .register_initializer("Message", || {
            let mut fields = schema_codec::Fields::new();
            fields.insert("received".into(), Value::Bool(false));
            fields
        })
        .expect("Message defaults");
    registry
        .register_initializer("Ping", || {
            let mut fields = schema_codec::Fields::new();
            fields.insert("received".into(), Value::Bool(true));
            fields
        })
        .expect("Ping defaults");

    let ping = StructValue::new("Ping").with("seq", 1u32).with("nonce", 2u64);
    let bytes = registry
        .encode(&Value::Struct(ping))
        .expect("encode");
    let decoded = registry
        .decode(&bytes, "Message", DecodeOptions::construct())
        .expect("decode");
    let decoded = decoded.as_struct().expect("struct");
    assert_eq!(decoded.get_as::<bool>("received"), Some(true));
    assert_eq!(decoded.get_as::<u64>("nonce"), Some(2));

    let request = registry
        .encode(&Value::Struct(request(3, "x")))
        .expect("encode");
    let decoded = registry
        .decode(&request, "Message", DecodeOptions::construct())
        .expect("decode");
    assert_eq!(
        decoded.as_struct().and_then(|s| s.get_as::<bool>("received")),
        Some(false)
    );
}
