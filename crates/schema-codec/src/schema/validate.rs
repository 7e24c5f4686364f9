// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registry validation.
//!
//! Starting from the given types, every hierarchy reachable through struct
//! fields is walked once, top-most ancestor first. Per type:
//!
//! 1. no hole in the field slots of its level
//! 2. its descendants are distinguishable (one discriminator kind, unique
//!    values, no pair of undiscriminated branches)
//! 3. every struct-typed field points at a resolvable type

use super::descriptor::TypeName;
use super::registry::SchemaRegistry;
use crate::error::{SchemaError, SchemaResult};
use std::collections::HashSet;

/// Knobs for [`SchemaRegistry::validate_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Skip the check that struct-typed fields point at resolvable types.
    pub allow_undefined: bool,
}

impl SchemaRegistry {
    pub fn validate(&self, types: &[&str]) -> SchemaResult<()> {
        self.validate_with(types, ValidateOptions::default())
    }

    /// Like [`validate`](Self::validate), tolerating field types that are not
    /// registered yet (deferred loading).
    pub fn validate_allowing_undefined(&self, types: &[&str]) -> SchemaResult<()> {
        self.validate_with(
            types,
            ValidateOptions {
                allow_undefined: true,
            },
        )
    }

    pub fn validate_with(&self, types: &[&str], options: ValidateOptions) -> SchemaResult<()> {
        let mut visited: HashSet<TypeName> = HashSet::new();
        let mut pending: Vec<TypeName> = Vec::with_capacity(types.len());
        for name in types {
            pending.push(self.root_of(name)?);
        }

        while let Some(top) = pending.pop() {
            if !visited.insert(top.clone()) {
                continue;
            }
            let mut members = vec![top.clone()];
            members.extend(self.subtree(&top));

            for name in &members {
                let node = self.node_or_err(name)?;
                self.dispatch_shape(name)?;

                let Some(schema) = node.schema() else {
                    continue;
                };
                if let Some(index) = schema.first_gap() {
                    return Err(SchemaError::IndexGap {
                        type_name: name.to_string(),
                        index,
                    });
                }
                for slot in schema.fields() {
                    for referenced in slot.descriptor.struct_refs() {
                        let resolvable =
                            self.contains(referenced) && self.is_resolvable(referenced)?;
                        if !resolvable && !options.allow_undefined {
                            return Err(SchemaError::UnresolvedType {
                                type_name: name.to_string(),
                                field: slot.key.to_string(),
                                referenced: referenced.to_string(),
                            });
                        }
                        if self.contains(referenced) {
                            pending.push(self.root_of(referenced)?);
                        }
                    }
                }
            }
        }

        log::debug!("[registry] validated {} hierarchies", visited.len());
        Ok(())
    }
}
