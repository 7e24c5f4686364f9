// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type hierarchy and per-level schemas.
//!
//! Every registered type is a [`TypeNode`] with at most one parent. A node
//! optionally owns a [`StructSchema`]: the fields, discriminator and
//! whole-type codec that this level contributes to the wire layout of itself
//! and of every type below it.
//!
//! Registration takes `&mut self`; encode and decode take `&self` and share
//! the compiled handlers held in the registry's cache. Any registration that
//! touches a type drops the cached handlers of that type, its ancestors and
//! its subtree, so the next use recompiles against the current graph.

use super::builder::StructBuilder;
use super::descriptor::{FieldSlot, StructCodec, TypeDescriptor, TypeName};
use super::discriminator::{Discriminator, DiscriminatorKind};
use crate::config::{CodecConfig, ConfigError};
use crate::engine::cache::{HandlerCache, HandlerStats};
use crate::error::{SchemaError, SchemaResult};
use crate::value::Fields;
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Produces the default field values of one level for construct-mode decode.
pub type Initializer = Arc<dyn Fn() -> Fields<'static> + Send + Sync>;

// ---------------------------------------------------------------------------
// StructSchema
// ---------------------------------------------------------------------------

/// What one level contributes to the layout.
#[derive(Clone, Default)]
pub struct StructSchema {
    /// Slot `i` holds the field at position `i`; `None` is a hole left by an
    /// explicit index registered ahead of its predecessors.
    fields: Vec<Option<FieldSlot>>,
    discriminator: Option<Discriminator>,
    codec: Option<Arc<dyn StructCodec>>,
}

impl StructSchema {
    /// Registered fields in wire order, holes skipped.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSlot> {
        self.fields.iter().flatten()
    }

    pub fn slots(&self) -> &[Option<FieldSlot>] {
        &self.fields
    }

    /// First empty slot below the highest registered index.
    pub fn first_gap(&self) -> Option<usize> {
        self.fields.iter().position(Option::is_none)
    }

    pub fn discriminator(&self) -> Option<&Discriminator> {
        self.discriminator.as_ref()
    }

    pub fn codec(&self) -> Option<&Arc<dyn StructCodec>> {
        self.codec.as_ref()
    }

    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Whether the level shows up on the wire at all.
    pub fn is_significant(&self) -> bool {
        self.has_fields() || self.discriminator.is_some()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|s| &*s.key == key))
    }

    fn insert_field(
        &mut self,
        type_name: &str,
        key: &str,
        index: Option<usize>,
        descriptor: TypeDescriptor,
    ) -> SchemaResult<()> {
        if let Some(current) = self.position(key) {
            if let Some(requested) = index.filter(|requested| *requested != current) {
                return Err(SchemaError::FieldIndexConflict {
                    type_name: type_name.to_string(),
                    key: key.to_string(),
                    current,
                    requested,
                });
            }
            if let Some(slot) = self.fields[current].as_mut() {
                slot.descriptor = descriptor;
            }
            return Ok(());
        }

        let position = index.unwrap_or(self.fields.len());
        if position >= self.fields.len() {
            self.fields.resize_with(position + 1, || None);
        }
        if let Some(existing) = &self.fields[position] {
            return Err(SchemaError::DuplicateFieldIndex {
                type_name: type_name.to_string(),
                index: position,
                existing: existing.key.to_string(),
                key: key.to_string(),
            });
        }
        self.fields[position] = Some(FieldSlot {
            key: Arc::from(key),
            index,
            descriptor,
        });
        Ok(())
    }
}

impl fmt::Debug for StructSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructSchema")
            .field("fields", &self.fields)
            .field("discriminator", &self.discriminator)
            .field("codec", &self.codec.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// TypeNode
// ---------------------------------------------------------------------------

/// One type in the hierarchy.
#[derive(Clone)]
pub struct TypeNode {
    name: TypeName,
    parent: Option<TypeName>,
    children: Vec<TypeName>,
    schema: Option<StructSchema>,
    initializer: Option<Initializer>,
}

impl TypeNode {
    fn new(name: TypeName) -> Self {
        Self {
            name,
            parent: None,
            children: Vec::new(),
            schema: None,
            initializer: None,
        }
    }

    pub fn name(&self) -> &TypeName {
        &self.name
    }

    pub fn parent(&self) -> Option<&TypeName> {
        self.parent.as_ref()
    }

    /// Direct subtypes in declaration order.
    pub fn children(&self) -> &[TypeName] {
        &self.children
    }

    pub fn schema(&self) -> Option<&StructSchema> {
        self.schema.as_ref()
    }

    pub fn is_significant(&self) -> bool {
        self.schema.as_ref().is_some_and(StructSchema::is_significant)
    }

    fn schema_mut(&mut self) -> &mut StructSchema {
        self.schema.get_or_insert_with(StructSchema::default)
    }
}

impl fmt::Debug for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeNode")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("schema", &self.schema)
            .field("initializer", &self.initializer.is_some())
            .finish()
    }
}

/// How decode continues below a level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DispatchShape {
    /// No significant descendant; the level is the concrete type.
    Leaf,
    /// Exactly one undiscriminated descendant, descended into unconditionally.
    PassThrough(TypeName),
    /// Read one discriminator of `kind` and pick the matching target.
    Keyed {
        kind: DiscriminatorKind,
        targets: Vec<(Discriminator, TypeName)>,
    },
}

// ---------------------------------------------------------------------------
// SchemaRegistry
// ---------------------------------------------------------------------------

/// Type graph, schemas, codec limits and compiled handlers.
pub struct SchemaRegistry {
    nodes: HashMap<TypeName, TypeNode>,
    pub(crate) handlers: HandlerCache,
    config: ArcSwap<CodecConfig>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("types", &self.nodes.len())
            .field("handlers", &self.handlers.len())
            .field("config", &**self.config.load())
            .finish()
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            handlers: HandlerCache::new(),
            config: ArcSwap::from_pointee(CodecConfig::default()),
        }
    }

    /// Registry with custom limits, rejected when a limit is zero.
    pub fn with_config(config: CodecConfig) -> Result<Self, ConfigError> {
        config.check()?;
        let registry = Self::new();
        registry.config.store(Arc::new(config));
        Ok(registry)
    }

    /// Current limits (lock-free snapshot).
    pub fn config(&self) -> Arc<CodecConfig> {
        self.config.load_full()
    }

    /// Replace the limits; in-flight calls keep the snapshot they loaded.
    /// An invalid config leaves the current one in place.
    pub fn set_config(&self, config: CodecConfig) -> Result<(), ConfigError> {
        config.check()?;
        log::debug!("[registry] config replaced: {:?}", config);
        self.config.store(Arc::new(config));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Hierarchy declaration
    // -----------------------------------------------------------------------

    /// Declare a root type. No-op for a type that is already known.
    pub fn declare(&mut self, name: &str) -> TypeName {
        self.ensure_node(name)
    }

    /// Declare `name` as a direct subtype of `parent`.
    ///
    /// `parent` must be known. A known root may be attached later (types
    /// auto-declared by an earlier registration), but a type never moves
    /// from one parent to another.
    pub fn declare_subtype(&mut self, name: &str, parent: &str) -> SchemaResult<()> {
        let parent_name = self.known(parent)?;
        let limit = self.config().max_hierarchy_depth;

        if let Some(existing) = self.nodes.get(name) {
            match existing.parent.as_deref() {
                Some(current) if current == parent => return Ok(()),
                Some(current) => {
                    return Err(SchemaError::ParentMismatch {
                        type_name: name.to_string(),
                        existing: Some(current.to_string()),
                        requested: parent.to_string(),
                    })
                }
                None => {}
            }
        }

        let chain_len = self.level(parent)? + 2 + self.height(name);
        if name == parent || self.is_ancestor(name, parent) || chain_len > limit {
            return Err(SchemaError::HierarchyTooDeep {
                type_name: name.to_string(),
                limit,
            });
        }

        let child = self.ensure_node(name);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent_name.clone());
        }
        if let Some(node) = self.nodes.get_mut(&parent_name) {
            node.children.push(child.clone());
        }
        log::debug!("[registry] {} extends {}", child, parent_name);
        self.invalidate_around(&child);
        Ok(())
    }

    fn ensure_node(&mut self, name: &str) -> TypeName {
        if let Some((key, _)) = self.nodes.get_key_value(name) {
            return key.clone();
        }
        let key: TypeName = Arc::from(name);
        self.nodes.insert(key.clone(), TypeNode::new(key.clone()));
        key
    }

    fn known(&self, name: &str) -> SchemaResult<TypeName> {
        self.nodes
            .get_key_value(name)
            .map(|(key, _)| key.clone())
            .ok_or_else(|| SchemaError::UnknownType {
                type_name: name.to_string(),
            })
    }

    // -----------------------------------------------------------------------
    // Level registration
    // -----------------------------------------------------------------------

    /// Add or replace a field of `type_name`'s own level.
    ///
    /// Without `index` the field is appended. Re-registering a key replaces
    /// its descriptor in place.
    pub fn register_field(
        &mut self,
        type_name: &str,
        key: &str,
        index: Option<usize>,
        descriptor: TypeDescriptor,
    ) -> SchemaResult<()> {
        let name = self.ensure_node(type_name);
        if let Some(node) = self.nodes.get_mut(&name) {
            node.schema_mut()
                .insert_field(type_name, key, index, descriptor)?;
        }
        self.invalidate_around(&name);
        Ok(())
    }

    /// Set the discriminator of `type_name`'s level.
    ///
    /// A clash with a sibling is logged here and reported by
    /// [`validate`](Self::validate); the registration itself is kept so
    /// types may be registered in any order.
    pub fn register_discriminator(
        &mut self,
        type_name: &str,
        discriminator: impl Into<Discriminator>,
    ) -> SchemaResult<()> {
        let discriminator = discriminator.into();
        let name = self.ensure_node(type_name);
        self.warn_on_sibling_conflict(&name, &discriminator);
        if let Some(node) = self.nodes.get_mut(&name) {
            node.schema_mut().discriminator = Some(discriminator);
        }
        self.invalidate_around(&name);
        Ok(())
    }

    /// Replace field emission of `type_name`'s level on encode.
    pub fn register_struct_codec(
        &mut self,
        type_name: &str,
        codec: impl StructCodec + 'static,
    ) -> SchemaResult<()> {
        self.register_shared_codec(type_name, Arc::new(codec))
    }

    pub(crate) fn register_shared_codec(
        &mut self,
        type_name: &str,
        codec: Arc<dyn StructCodec>,
    ) -> SchemaResult<()> {
        let name = self.ensure_node(type_name);
        if let Some(node) = self.nodes.get_mut(&name) {
            node.schema_mut().codec = Some(codec);
        }
        self.invalidate_around(&name);
        Ok(())
    }

    /// Default field values of `type_name`'s level for construct-mode decode.
    pub fn register_initializer<F>(&mut self, type_name: &str, init: F) -> SchemaResult<()>
    where
        F: Fn() -> Fields<'static> + Send + Sync + 'static,
    {
        self.register_shared_initializer(type_name, Arc::new(init))
    }

    pub(crate) fn register_shared_initializer(
        &mut self,
        type_name: &str,
        init: Initializer,
    ) -> SchemaResult<()> {
        let name = self.ensure_node(type_name);
        if let Some(node) = self.nodes.get_mut(&name) {
            node.initializer = Some(init);
        }
        Ok(())
    }

    /// Fluent registration of one level.
    pub fn define(&mut self, type_name: &str) -> StructBuilder<'_> {
        StructBuilder::new(self, type_name)
    }

    fn warn_on_sibling_conflict(&self, name: &str, discriminator: &Discriminator) {
        let Some(parent) = self.nodes.get(name).and_then(|n| n.parent.clone()) else {
            return;
        };
        let Ok(siblings) = self.descendants(&parent) else {
            return;
        };
        for sibling in siblings.iter().filter(|s| &***s != name) {
            let Some(other) = self
                .nodes
                .get(sibling)
                .and_then(|n| n.schema.as_ref())
                .and_then(StructSchema::discriminator)
            else {
                continue;
            };
            if other.kind() != discriminator.kind() {
                log::warn!(
                    "[registry] {} uses a {} discriminator but sibling {} uses {}",
                    name,
                    discriminator.kind(),
                    sibling,
                    other.kind()
                );
            } else if other == discriminator {
                log::warn!(
                    "[registry] {} reuses discriminator {} of sibling {}",
                    name,
                    discriminator,
                    sibling
                );
            }
        }
    }

    // -----------------------------------------------------------------------
    // Graph queries
    // -----------------------------------------------------------------------

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn node(&self, name: &str) -> Option<&TypeNode> {
        self.nodes.get(name)
    }

    pub(crate) fn node_or_err(&self, name: &str) -> SchemaResult<&TypeNode> {
        self.nodes.get(name).ok_or_else(|| SchemaError::UnknownType {
            type_name: name.to_string(),
        })
    }

    /// Registered type names, unordered.
    pub fn types(&self) -> impl Iterator<Item = &TypeName> {
        self.nodes.keys()
    }

    /// The type itself followed by its ancestors, nearest first.
    pub fn ancestry(&self, name: &str) -> SchemaResult<Vec<&TypeNode>> {
        let limit = self.config().max_hierarchy_depth;
        let mut out = Vec::new();
        let mut current = Some(self.node_or_err(name)?);
        while let Some(node) = current {
            if out.len() >= limit {
                return Err(SchemaError::HierarchyTooDeep {
                    type_name: name.to_string(),
                    limit,
                });
            }
            out.push(node);
            current = match &node.parent {
                Some(parent) => Some(self.node_or_err(parent)?),
                None => None,
            };
        }
        Ok(out)
    }

    /// Root first, the type itself last: wire order.
    pub fn chain(&self, name: &str) -> SchemaResult<Vec<&TypeNode>> {
        let mut chain = self.ancestry(name)?;
        chain.reverse();
        Ok(chain)
    }

    pub fn root_of(&self, name: &str) -> SchemaResult<TypeName> {
        let ancestry = self.ancestry(name)?;
        ancestry
            .last()
            .map(|node| node.name.clone())
            .ok_or_else(|| SchemaError::UnknownType {
                type_name: name.to_string(),
            })
    }

    /// Number of ancestors (0 for a root).
    pub fn level(&self, name: &str) -> SchemaResult<usize> {
        Ok(self.ancestry(name)?.len() - 1)
    }

    /// Schema registered `depth` levels above `name` (0 is `name` itself).
    pub fn schema_at(&self, name: &str, depth: usize) -> SchemaResult<Option<&StructSchema>> {
        Ok(self
            .ancestry(name)?
            .get(depth)
            .and_then(|node| node.schema.as_ref()))
    }

    /// Whether `ancestor` is a strict ancestor of `name`.
    pub fn is_ancestor(&self, ancestor: &str, name: &str) -> bool {
        let limit = self.config().max_hierarchy_depth;
        let mut current = self.nodes.get(name).and_then(|n| n.parent.as_ref());
        let mut steps = 0;
        while let Some(parent) = current {
            if &**parent == ancestor {
                return true;
            }
            steps += 1;
            if steps > limit {
                return false;
            }
            current = self.nodes.get(parent).and_then(|n| n.parent.as_ref());
        }
        false
    }

    /// Equal, ancestor or descendant.
    pub fn is_compatible(&self, a: &str, b: &str) -> bool {
        a == b || self.is_ancestor(a, b) || self.is_ancestor(b, a)
    }

    /// Significant types directly below `name`, looking through trivial
    /// intermediate types.
    pub fn descendants(&self, name: &str) -> SchemaResult<Vec<TypeName>> {
        let node = self.node_or_err(name)?;
        let mut out = Vec::new();
        let mut stack: Vec<&TypeName> = node.children.iter().rev().collect();
        while let Some(child) = stack.pop() {
            let Some(child_node) = self.nodes.get(child) else {
                continue;
            };
            if child_node.is_significant() {
                out.push(child.clone());
            } else {
                stack.extend(child_node.children.iter().rev());
            }
        }
        Ok(out)
    }

    /// Every structural descendant of `name`, depth first.
    pub fn subtree(&self, name: &str) -> Vec<TypeName> {
        let mut out = Vec::new();
        let mut stack: Vec<&TypeName> = match self.nodes.get(name) {
            Some(node) => node.children.iter().rev().collect(),
            None => return out,
        };
        while let Some(child) = stack.pop() {
            out.push(child.clone());
            if let Some(node) = self.nodes.get(child) {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    fn height(&self, name: &str) -> usize {
        fn walk(registry: &SchemaRegistry, name: &str, guard: usize) -> usize {
            if guard == 0 {
                return 0;
            }
            registry
                .nodes
                .get(name)
                .map(|node| {
                    node.children
                        .iter()
                        .map(|child| 1 + walk(registry, child, guard - 1))
                        .max()
                        .unwrap_or(0)
                })
                .unwrap_or(0)
        }
        walk(self, name, self.config().max_hierarchy_depth)
    }

    /// A type can be encoded or decoded when some level of its chain has a
    /// schema, or when it dispatches to registered descendants.
    pub fn is_resolvable(&self, name: &str) -> SchemaResult<bool> {
        if self
            .ancestry(name)?
            .iter()
            .any(|node| node.schema.is_some())
        {
            return Ok(true);
        }
        Ok(!self.descendants(name)?.is_empty())
    }

    /// How decode continues below `name`.
    ///
    /// Fails when the siblings cannot be told apart: mixed discriminator
    /// kinds, a repeated value, or several undiscriminated descendants.
    pub(crate) fn dispatch_shape(&self, name: &str) -> SchemaResult<DispatchShape> {
        let targets = self.descendants(name)?;
        if targets.is_empty() {
            return Ok(DispatchShape::Leaf);
        }

        let mut keyed: Vec<(Discriminator, TypeName)> = Vec::new();
        let mut plain: Vec<TypeName> = Vec::new();
        for target in targets {
            let discriminator = self
                .nodes
                .get(&target)
                .and_then(|n| n.schema.as_ref())
                .and_then(StructSchema::discriminator)
                .cloned();
            match discriminator {
                Some(d) => keyed.push((d, target)),
                None => plain.push(target),
            }
        }

        let Some((first, first_name)) = keyed.first() else {
            if plain.len() == 1 {
                return Ok(DispatchShape::PassThrough(plain.remove(0)));
            }
            return Err(SchemaError::AmbiguousHierarchy {
                ancestor: name.to_string(),
                descendants: plain.iter().map(|t| t.to_string()).collect(),
            });
        };

        let kind = first.kind();
        if let Some(untagged) = plain.first() {
            return Err(SchemaError::InconsistentDiscriminatorKind {
                ancestor: name.to_string(),
                first: first_name.to_string(),
                first_kind: kind.to_string(),
                second: untagged.to_string(),
                second_kind: "none".to_string(),
            });
        }
        if let Some((other, other_name)) = keyed.iter().find(|(d, _)| d.kind() != kind) {
            return Err(SchemaError::InconsistentDiscriminatorKind {
                ancestor: name.to_string(),
                first: first_name.to_string(),
                first_kind: kind.to_string(),
                second: other_name.to_string(),
                second_kind: other.kind().to_string(),
            });
        }
        for (i, (value, first)) in keyed.iter().enumerate() {
            if let Some((_, second)) = keyed[i + 1..].iter().find(|(d, _)| d == value) {
                return Err(SchemaError::DuplicateDiscriminator {
                    ancestor: name.to_string(),
                    first: first.to_string(),
                    second: second.to_string(),
                    discriminator: value.to_string(),
                });
            }
        }

        Ok(DispatchShape::Keyed {
            kind,
            targets: keyed,
        })
    }

    // -----------------------------------------------------------------------
    // Derived data
    // -----------------------------------------------------------------------

    /// Initializer output of every level, root first, later levels winning.
    pub fn initial_fields(&self, name: &str) -> SchemaResult<Fields<'static>> {
        let mut fields = Fields::new();
        for node in self.chain(name)? {
            if let Some(init) = &node.initializer {
                fields.extend(init());
            }
        }
        Ok(fields)
    }

    /// Concatenated discriminators of `name`'s chain: a payload-independent
    /// type tag.
    ///
    /// Only defined when no level above the last schema level declares
    /// fields, since those fields would sit between the discriminators.
    pub fn discriminator_prefix(&self, name: &str) -> SchemaResult<Vec<u8>> {
        let chain = self.chain(name)?;
        let levels: Vec<&TypeNode> = chain.into_iter().filter(|n| n.schema.is_some()).collect();
        if levels.is_empty() {
            return Err(SchemaError::NotRegistered {
                type_name: name.to_string(),
            });
        }

        let mut prefix = Vec::new();
        let last = levels.len() - 1;
        for (i, node) in levels.iter().enumerate() {
            let Some(schema) = &node.schema else {
                continue;
            };
            if i < last && schema.has_fields() {
                return Err(SchemaError::PrefixUndefined {
                    type_name: name.to_string(),
                    level: node.name.to_string(),
                });
            }
            if let Some(d) = &schema.discriminator {
                prefix.extend(d.to_bytes());
            }
        }
        Ok(prefix)
    }

    // -----------------------------------------------------------------------
    // Handler cache
    // -----------------------------------------------------------------------

    fn invalidate_around(&self, name: &TypeName) {
        let mut affected: Vec<TypeName> = self
            .ancestry(name)
            .map(|nodes| nodes.iter().map(|n| n.name.clone()).collect())
            .unwrap_or_else(|_| vec![name.clone()]);
        affected.extend(self.subtree(name));
        self.handlers.invalidate(&affected);
    }

    /// Cache hit / miss / invalidation counters.
    pub fn handler_stats(&self) -> HandlerStats {
        self.handlers.stats()
    }

    /// Drop every compiled handler.
    pub fn clear_handlers(&self) {
        self.handlers.clear();
    }
}
