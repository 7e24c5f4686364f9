// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Struct instances.

use super::{FromValue, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Field name to value mapping.
pub type Fields<'a> = HashMap<String, Value<'a>>;

/// Instance of a registered type: concrete type name plus field values.
///
/// Carries a memo slot that whole-type codecs may fill with the instance's
/// encoding (see [`MemoizedEncoding`](crate::schema::MemoizedEncoding)).
/// Mutating a field clears the memo; equality ignores it.
#[derive(Clone)]
pub struct StructValue<'a> {
    type_name: Arc<str>,
    fields: Fields<'a>,
    memo: OnceLock<Arc<[u8]>>,
}

impl<'a> StructValue<'a> {
    pub fn new(type_name: impl Into<Arc<str>>) -> Self {
        Self::from_fields(type_name, Fields::new())
    }

    pub fn from_fields(type_name: impl Into<Arc<str>>, fields: Fields<'a>) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
            memo: OnceLock::new(),
        }
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value<'a>>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a field, returning the previous value.
    pub fn set(&mut self, key: &str, value: impl Into<Value<'a>>) -> Option<Value<'a>> {
        self.memo = OnceLock::new();
        self.fields.insert(key.to_string(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value<'a>> {
        self.fields.get(key)
    }

    /// Typed field access.
    pub fn get_as<T: FromValue<'a>>(&self, key: &str) -> Option<T> {
        self.fields.get(key).and_then(T::from_value)
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn type_name_arc(&self) -> &Arc<str> {
        &self.type_name
    }

    pub fn fields(&self) -> &Fields<'a> {
        &self.fields
    }

    pub fn into_fields(self) -> Fields<'a> {
        self.fields
    }

    /// Cached encoding slot owned by this instance.
    pub fn memo(&self) -> &OnceLock<Arc<[u8]>> {
        &self.memo
    }

    pub fn into_owned(self) -> StructValue<'static> {
        StructValue {
            type_name: self.type_name,
            fields: self
                .fields
                .into_iter()
                .map(|(k, v)| (k, v.into_owned()))
                .collect(),
            memo: self.memo,
        }
    }
}

impl PartialEq for StructValue<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.fields == other.fields
    }
}

impl fmt::Debug for StructValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.fields.keys().collect();
        keys.sort();
        let mut out = f.debug_struct(&self.type_name);
        for key in keys {
            out.field(key, &self.fields[key]);
        }
        out.finish()
    }
}
