// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registry, builder and validation tests.

use super::registry::DispatchShape;
use super::*;
use crate::config::{CodecConfig, ConfigError};
use crate::error::SchemaError;
use crate::value::{Fields, StructValue, Value};

fn keys(schema: &StructSchema) -> Vec<&str> {
    schema.fields().map(|slot| &*slot.key).collect()
}

#[test]
fn test_implicit_field_order() {
    let mut registry = SchemaRegistry::new();
    registry
        .register_field("Pair", "a", None, TypeDescriptor::u8())
        .expect("a");
    registry
        .register_field("Pair", "b", None, TypeDescriptor::u8())
        .expect("b");

    let schema = registry
        .node("Pair")
        .and_then(TypeNode::schema)
        .expect("schema registered");
    assert_eq!(keys(schema), vec!["a", "b"]);
    registry.validate(&["Pair"]).expect("valid");
}

#[test]
fn test_explicit_indices_reorder_fields() {
    let mut registry = SchemaRegistry::new();
    registry
        .define("Swapped")
        .field_at("a", 1, TypeDescriptor::u8())
        .field_at("b", 0, TypeDescriptor::u8())
        .finish()
        .expect("define");

    let schema = registry.schema_at("Swapped", 0).expect("known").expect("schema");
    assert_eq!(keys(schema), vec!["b", "a"]);
    assert_eq!(schema.first_gap(), None);
}

#[test]
fn test_index_gaps_rejected_by_validation() {
    let mut registry = SchemaRegistry::new();
    registry
        .register_field("Offset", "a", Some(1), TypeDescriptor::u8())
        .expect("registration accepts holes");
    assert!(matches!(
        registry.validate(&["Offset"]),
        Err(SchemaError::IndexGap { index: 0, .. })
    ));

    registry
        .define("Gappy")
        .field_at("a", 0, TypeDescriptor::u8())
        .field_at("b", 2, TypeDescriptor::u8())
        .finish()
        .expect("define");
    assert!(matches!(
        registry.validate(&["Gappy"]),
        Err(SchemaError::IndexGap { index: 1, .. })
    ));
}

#[test]
fn test_duplicate_index_and_reregistration() {
    let mut registry = SchemaRegistry::new();
    registry
        .register_field("T", "a", Some(0), TypeDescriptor::u8())
        .expect("a");
    let err = registry
        .register_field("T", "b", Some(0), TypeDescriptor::u8())
        .expect_err("slot 0 is taken");
    assert!(matches!(err, SchemaError::DuplicateFieldIndex { index: 0, .. }));

    // Same key replaces the descriptor in place.
    registry
        .register_field("T", "a", None, TypeDescriptor::u32())
        .expect("replace");
    let schema = registry.schema_at("T", 0).expect("known").expect("schema");
    assert_eq!(schema.fields().count(), 1);
    assert_eq!(
        schema.fields().next().map(|slot| slot.descriptor.to_string()),
        Some("u32".to_string())
    );

    let err = registry
        .register_field("T", "a", Some(3), TypeDescriptor::u8())
        .expect_err("cannot move a field");
    assert!(matches!(
        err,
        SchemaError::FieldIndexConflict {
            current: 0,
            requested: 3,
            ..
        }
    ));
    assert!(registry.schema_at("T", 0).expect("known").is_some());
}

#[test]
fn test_hierarchy_declaration() {
    let mut registry = SchemaRegistry::new();
    assert!(matches!(
        registry.declare_subtype("Child", "Nobody"),
        Err(SchemaError::UnknownType { .. })
    ));

    registry.declare("Base");
    registry.declare("Other");
    registry.declare_subtype("Child", "Base").expect("child");
    registry
        .declare_subtype("Child", "Base")
        .expect("same parent is idempotent");
    assert!(matches!(
        registry.declare_subtype("Child", "Other"),
        Err(SchemaError::ParentMismatch { .. })
    ));

    // A type auto-declared as root may be attached later.
    registry
        .register_field("Late", "x", None, TypeDescriptor::u8())
        .expect("late");
    registry.declare_subtype("Late", "Child").expect("attach");
    assert_eq!(registry.root_of("Late").expect("root").as_ref(), "Base");
    assert_eq!(registry.level("Late").expect("level"), 2);
    assert!(registry.is_ancestor("Base", "Late"));
    assert!(registry.is_compatible("Late", "Base"));
    assert!(registry.is_compatible("Base", "Late"));
    assert!(!registry.is_compatible("Late", "Other"));

    // Cycles are refused.
    assert!(matches!(
        registry.declare_subtype("Base", "Late"),
        Err(SchemaError::HierarchyTooDeep { .. })
    ));
}

#[test]
fn test_hierarchy_depth_limit() {
    let mut registry = SchemaRegistry::with_config(CodecConfig {
        max_hierarchy_depth: 3,
        ..CodecConfig::default()
    })
    .expect("valid config");
    registry.declare("L0");
    registry.declare_subtype("L1", "L0").expect("L1");
    registry.declare_subtype("L2", "L1").expect("L2");
    assert!(matches!(
        registry.declare_subtype("L3", "L2"),
        Err(SchemaError::HierarchyTooDeep { limit: 3, .. })
    ));
}

#[test]
fn test_descendants_skip_trivial_levels() {
    let mut registry = SchemaRegistry::new();
    registry.declare("SuperSuper");
    registry.declare_subtype("Super", "SuperSuper").expect("Super");
    registry
        .define("Enum0")
        .extends("Super")
        .discriminator(0u8)
        .field("a", TypeDescriptor::u8())
        .finish()
        .expect("Enum0");
    registry
        .define("Enum1")
        .extends("Super")
        .discriminator(1u8)
        .field("b", TypeDescriptor::u8())
        .finish()
        .expect("Enum1");
    registry
        .define("EnumX")
        .extends("SuperSuper")
        .discriminator(66u8)
        .field("c", TypeDescriptor::u8())
        .finish()
        .expect("EnumX");

    let names: Vec<String> = registry
        .descendants("SuperSuper")
        .expect("known")
        .iter()
        .map(|n| n.to_string())
        .collect();
    assert_eq!(names, vec!["Enum0", "Enum1", "EnumX"]);
    assert_eq!(registry.subtree("SuperSuper").len(), 4);

    match registry.dispatch_shape("SuperSuper").expect("shape") {
        DispatchShape::Keyed { kind, targets } => {
            assert_eq!(kind, DiscriminatorKind::Byte);
            assert_eq!(targets.len(), 3);
        }
        other => panic!("expected keyed dispatch, got {:?}", other),
    }
    assert_eq!(
        registry.dispatch_shape("Enum0").expect("shape"),
        DispatchShape::Leaf
    );
}

#[test]
fn test_single_undiscriminated_descendant_passes_through() {
    let mut registry = SchemaRegistry::new();
    registry.declare("Super");
    registry
        .define("A")
        .extends("Super")
        .field("a", TypeDescriptor::u8())
        .finish()
        .expect("A");
    assert!(matches!(
        registry.dispatch_shape("Super"),
        Ok(DispatchShape::PassThrough(name)) if &*name == "A"
    ));

    registry
        .define("B")
        .extends("Super")
        .field("b", TypeDescriptor::string())
        .finish()
        .expect("B");
    assert!(matches!(
        registry.validate(&["Super"]),
        Err(SchemaError::AmbiguousHierarchy { .. })
    ));
}

#[test]
fn test_sibling_discriminator_conflicts() {
    let mut registry = SchemaRegistry::new();
    registry.declare("Base");
    registry
        .define("A")
        .extends("Base")
        .discriminator([0u8, 1, 2])
        .finish()
        .expect("A");
    registry
        .define("B")
        .extends("Base")
        .discriminator([0u8, 1, 2])
        .finish()
        .expect("registration is lenient");
    assert!(matches!(
        registry.validate(&["Base"]),
        Err(SchemaError::DuplicateDiscriminator { .. })
    ));

    registry
        .register_discriminator("B", [0u8, 1])
        .expect("replace");
    assert!(matches!(
        registry.validate(&["Base"]),
        Err(SchemaError::InconsistentDiscriminatorKind { .. })
    ));

    registry.register_discriminator("B", "b").expect("replace");
    assert!(matches!(
        registry.validate(&["Base"]),
        Err(SchemaError::InconsistentDiscriminatorKind { .. })
    ));

    registry
        .register_discriminator("B", [0u8, 1, 3])
        .expect("replace");
    registry.validate(&["Base"]).expect("now distinct");
}

#[test]
fn test_conflict_across_trivial_level() {
    let mut registry = SchemaRegistry::new();
    registry.declare("TestStructSuper");
    registry
        .declare_subtype("TestStruct", "TestStructSuper")
        .expect("TestStruct");
    registry
        .define("A")
        .extends("TestStruct")
        .discriminator([0u8, 1])
        .finish()
        .expect("A");
    registry
        .define("B")
        .extends("TestStructSuper")
        .discriminator([0u8, 1, 2])
        .finish()
        .expect("B");
    assert!(matches!(
        registry.validate(&["TestStruct"]),
        Err(SchemaError::InconsistentDiscriminatorKind { .. })
    ));
}

#[test]
fn test_unresolved_field_types() {
    let mut registry = SchemaRegistry::new();
    registry
        .register_field(
            "TestStruct",
            "missing",
            None,
            TypeDescriptor::struct_ref("MissingImplementation"),
        )
        .expect("field");
    assert!(matches!(
        registry.validate(&["TestStruct"]),
        Err(SchemaError::UnresolvedType { .. })
    ));
    registry
        .validate_allowing_undefined(&["TestStruct"])
        .expect("undefined allowed");

    // Declared but never given a schema or descendants is still unresolved.
    registry.declare("MissingImplementation");
    assert!(registry.validate(&["TestStruct"]).is_err());

    registry
        .register_field("MissingImplementation", "x", None, TypeDescriptor::u8())
        .expect("x");
    registry.validate(&["TestStruct"]).expect("resolved");
}

#[test]
fn test_validation_follows_nested_references() {
    let mut registry = SchemaRegistry::new();
    registry
        .register_field(
            "Outer",
            "inner",
            None,
            TypeDescriptor::option(TypeDescriptor::vec(TypeDescriptor::struct_ref("Inner"))),
        )
        .expect("outer");
    registry
        .register_field("Inner", "v", Some(1), TypeDescriptor::u8())
        .expect("inner");
    assert!(matches!(
        registry.validate(&["Outer"]),
        Err(SchemaError::IndexGap { .. })
    ));
}

#[test]
fn test_discriminator_prefix() {
    let mut registry = SchemaRegistry::new();
    registry.define("A").discriminator([1u8, 2]).finish().expect("A");
    registry.declare_subtype("B", "A").expect("B");
    registry
        .define("C")
        .extends("B")
        .discriminator(3u8)
        .finish()
        .expect("C");
    registry
        .define("D")
        .extends("C")
        .discriminator("abc")
        .field("string", TypeDescriptor::string())
        .finish()
        .expect("D");

    assert_eq!(
        registry.discriminator_prefix("D").expect("prefix"),
        vec![1, 2, 3, 3, 0, 0, 0, 97, 98, 99]
    );
    assert_eq!(registry.discriminator_prefix("B").expect("prefix"), vec![1, 2]);
}

#[test]
fn test_discriminator_prefix_undefined_across_fields() {
    let mut registry = SchemaRegistry::new();
    registry
        .define("A")
        .discriminator([1u8, 2])
        .field("string", TypeDescriptor::string())
        .finish()
        .expect("A");
    registry
        .define("B")
        .extends("A")
        .discriminator(3u8)
        .finish()
        .expect("B");
    assert!(matches!(
        registry.discriminator_prefix("B"),
        Err(SchemaError::PrefixUndefined { .. })
    ));

    registry.declare("Bare");
    assert!(matches!(
        registry.discriminator_prefix("Bare"),
        Err(SchemaError::NotRegistered { .. })
    ));
}

#[test]
fn test_initial_fields_merge_root_first() {
    let mut registry = SchemaRegistry::new();
    registry
        .define("Base")
        .field("a", TypeDescriptor::u8())
        .initializer(|| {
            let mut fields = Fields::new();
            fields.insert("label".into(), Value::from("base"));
            fields.insert("a".into(), Value::U8(1));
            fields
        })
        .finish()
        .expect("Base");
    registry
        .define("Leaf")
        .extends("Base")
        .initializer(|| {
            let mut fields = Fields::new();
            fields.insert("label".into(), Value::from("leaf"));
            fields
        })
        .finish()
        .expect("Leaf");

    let fields = registry.initial_fields("Leaf").expect("fields");
    assert_eq!(fields.get("label"), Some(&Value::from("leaf")));
    assert_eq!(fields.get("a"), Some(&Value::U8(1)));
}

#[test]
fn test_config_swap() {
    let registry = SchemaRegistry::new();
    assert_eq!(registry.config().max_hierarchy_depth, 250);
    registry
        .set_config(CodecConfig {
            max_nesting_depth: 8,
            ..CodecConfig::default()
        })
        .expect("valid config");
    assert_eq!(registry.config().max_nesting_depth, 8);
    let active = registry.config();

    // Zero limits are refused and the previous config stays active.
    for invalid in [
        CodecConfig {
            max_hierarchy_depth: 0,
            ..CodecConfig::default()
        },
        CodecConfig {
            max_nesting_depth: 0,
            ..CodecConfig::default()
        },
    ] {
        assert!(matches!(
            registry.set_config(invalid),
            Err(ConfigError::Invalid { .. })
        ));
        assert_eq!(registry.config(), active);
    }
    assert_eq!(
        SchemaRegistry::with_config(CodecConfig {
            max_hierarchy_depth: 0,
            ..CodecConfig::default()
        })
        .err(),
        Some(ConfigError::Invalid {
            field: "max_hierarchy_depth"
        })
    );

    // A registry keeps working after a refused swap.
    let mut registry = SchemaRegistry::new();
    registry
        .define("Leaf")
        .field("a", TypeDescriptor::u8())
        .finish()
        .expect("Leaf");
    assert!(registry
        .set_config(CodecConfig {
            max_hierarchy_depth: 0,
            ..CodecConfig::default()
        })
        .is_err());
    assert_eq!(
        registry
            .encode(&Value::Struct(StructValue::new("Leaf").with("a", 1u8)))
            .expect("encode"),
        vec![1]
    );
}
