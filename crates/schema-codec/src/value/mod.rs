// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic values.
//!
//! [`Value`] is what the engine encodes from and decodes into. Byte and
//! string payloads are `Cow`s so decoded values can borrow from the input
//! buffer; [`Value::into_owned`] detaches them.
//!
//! Optional fields have no wrapper variant: an absent value is
//! [`Value::Null`], a present one is the inner value itself.

mod structure;

pub use structure::{Fields, StructValue};

use crate::core::wide::{U256, U512};
use std::borrow::Cow;

/// A value of any wire type.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value<'a> {
    #[default]
    Null,

    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    U256(U256),
    U512(U512),
    F32(f32),
    F64(f64),
    String(Cow<'a, str>),
    Bytes(Cow<'a, [u8]>),

    List(Vec<Value<'a>>),
    /// Instance of a registered type.
    Struct(StructValue<'a>),
    /// Untyped field mapping ("plain data" decode output).
    Record(Fields<'a>),
}

impl<'a> Value<'a> {
    /// Build a list from anything convertible to values.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value<'a>>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Any unsigned integer, widened. `None` for other variants.
    pub fn as_wide(&self) -> Option<U512> {
        match self {
            Self::U8(v) => Some(U512::from(u32::from(*v))),
            Self::U16(v) => Some(U512::from(u32::from(*v))),
            Self::U32(v) => Some(U512::from(*v)),
            Self::U64(v) => Some(U512::from(*v)),
            Self::U128(v) => Some(U512::from(*v)),
            Self::U256(v) => Some(U512::from(*v)),
            Self::U512(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer as `u64` when it fits without loss.
    pub fn as_u64(&self) -> Option<u64> {
        self.as_wide().and_then(|v| u64::try_from(v).ok())
    }

    /// Integer as `u128` when it fits without loss.
    pub fn as_u128(&self) -> Option<u128> {
        self.as_wide().and_then(|v| u128::try_from(v).ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F32(v) => Some(f64::from(*v)),
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value<'a>]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue<'a>> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Fields<'a>> {
        match self {
            Self::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Short description used in type-mismatch errors.
    pub fn type_label(&self) -> String {
        match self {
            Self::Null => "null".into(),
            Self::Bool(_) => "bool".into(),
            Self::U8(_) => "u8".into(),
            Self::U16(_) => "u16".into(),
            Self::U32(_) => "u32".into(),
            Self::U64(_) => "u64".into(),
            Self::U128(_) => "u128".into(),
            Self::U256(_) => "u256".into(),
            Self::U512(_) => "u512".into(),
            Self::F32(_) => "f32".into(),
            Self::F64(_) => "f64".into(),
            Self::String(_) => "string".into(),
            Self::Bytes(_) => "bytes".into(),
            Self::List(_) => "list".into(),
            Self::Struct(s) => s.type_name().to_string(),
            Self::Record(_) => "record".into(),
        }
    }

    /// Detach from the input buffer.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Self::Null => Value::Null,
            Self::Bool(v) => Value::Bool(v),
            Self::U8(v) => Value::U8(v),
            Self::U16(v) => Value::U16(v),
            Self::U32(v) => Value::U32(v),
            Self::U64(v) => Value::U64(v),
            Self::U128(v) => Value::U128(v),
            Self::U256(v) => Value::U256(v),
            Self::U512(v) => Value::U512(v),
            Self::F32(v) => Value::F32(v),
            Self::F64(v) => Value::F64(v),
            Self::String(s) => Value::String(Cow::Owned(s.into_owned())),
            Self::Bytes(b) => Value::Bytes(Cow::Owned(b.into_owned())),
            Self::List(items) => Value::List(items.into_iter().map(Value::into_owned).collect()),
            Self::Struct(s) => Value::Struct(s.into_owned()),
            Self::Record(fields) => Value::Record(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, v.into_owned()))
                    .collect(),
            ),
        }
    }
}

macro_rules! impl_from_scalar {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Value<'_> {
            fn from(v: $ty) -> Self {
                Self::$variant(v)
            }
        }
    };
}

impl_from_scalar!(bool, Bool);
impl_from_scalar!(u8, U8);
impl_from_scalar!(u16, U16);
impl_from_scalar!(u32, U32);
impl_from_scalar!(u64, U64);
impl_from_scalar!(u128, U128);
impl_from_scalar!(U256, U256);
impl_from_scalar!(U512, U512);
impl_from_scalar!(f32, F32);
impl_from_scalar!(f64, F64);

impl<'a> From<&'a str> for Value<'a> {
    fn from(v: &'a str) -> Self {
        Self::String(Cow::Borrowed(v))
    }
}

impl From<String> for Value<'_> {
    fn from(v: String) -> Self {
        Self::String(Cow::Owned(v))
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(v: &'a [u8]) -> Self {
        Self::Bytes(Cow::Borrowed(v))
    }
}

impl From<Vec<u8>> for Value<'_> {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(Cow::Owned(v))
    }
}

impl<'a> From<Vec<Value<'a>>> for Value<'a> {
    fn from(v: Vec<Value<'a>>) -> Self {
        Self::List(v)
    }
}

impl<'a> From<StructValue<'a>> for Value<'a> {
    fn from(v: StructValue<'a>) -> Self {
        Self::Struct(v)
    }
}

impl<'a, T: Into<Value<'a>>> From<Option<T>> for Value<'a> {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Typed extraction from a [`Value`].
pub trait FromValue<'a>: Sized {
    fn from_value(value: &Value<'a>) -> Option<Self>;
}

macro_rules! impl_from_value_uint {
    ($ty:ty) => {
        impl<'a> FromValue<'a> for $ty {
            fn from_value(value: &Value<'a>) -> Option<Self> {
                value
                    .as_u128()
                    .and_then(|v| <$ty>::try_from(v).ok())
            }
        }
    };
}

impl_from_value_uint!(u8);
impl_from_value_uint!(u16);
impl_from_value_uint!(u32);
impl_from_value_uint!(u64);
impl_from_value_uint!(u128);

impl<'a> FromValue<'a> for U256 {
    fn from_value(value: &Value<'a>) -> Option<Self> {
        value.as_wide().and_then(|v| U256::try_from(v).ok())
    }
}

impl<'a> FromValue<'a> for U512 {
    fn from_value(value: &Value<'a>) -> Option<Self> {
        value.as_wide()
    }
}

impl<'a> FromValue<'a> for bool {
    fn from_value(value: &Value<'a>) -> Option<Self> {
        value.as_bool()
    }
}

impl<'a> FromValue<'a> for f64 {
    fn from_value(value: &Value<'a>) -> Option<Self> {
        value.as_f64()
    }
}

impl<'a> FromValue<'a> for f32 {
    fn from_value(value: &Value<'a>) -> Option<Self> {
        match value {
            Value::F32(v) => Some(*v),
            _ => None,
        }
    }
}

impl<'a> FromValue<'a> for String {
    fn from_value(value: &Value<'a>) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl<'a> FromValue<'a> for Vec<u8> {
    fn from_value(value: &Value<'a>) -> Option<Self> {
        value.as_bytes().map(<[u8]>::to_vec)
    }
}

impl<'a> FromValue<'a> for StructValue<'a> {
    fn from_value(value: &Value<'a>) -> Option<Self> {
        value.as_struct().cloned()
    }
}

impl<'a, T: FromValue<'a>> FromValue<'a> for Option<T> {
    fn from_value(value: &Value<'a>) -> Option<Self> {
        if value.is_null() {
            return Some(None);
        }
        T::from_value(value).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_widening_is_lossless_only() {
        assert_eq!(Value::U8(7).as_u64(), Some(7));
        assert_eq!(Value::U128(u128::from(u64::MAX) + 1).as_u64(), None);
        assert_eq!(Value::U256(U256::from(5u64)).as_u128(), Some(5));
        assert_eq!(Value::U512(U512::MAX).as_u128(), None);
        assert_eq!(u8::from_value(&Value::U64(255)), Some(255));
        assert_eq!(u8::from_value(&Value::U64(256)), None);
        assert_eq!(Value::String("x".into()).as_u64(), None);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<u8>), Value::Null);
        assert_eq!(Value::from(Some(3u8)), Value::U8(3));
        assert_eq!(Option::<u8>::from_value(&Value::Null), Some(None));
        assert_eq!(Option::<u8>::from_value(&Value::U8(1)), Some(Some(1)));
        assert_eq!(Option::<u8>::from_value(&Value::Bool(true)), None);
    }

    #[test]
    fn test_into_owned_detaches_borrowed_payloads() {
        let input = vec![1u8, 2, 3];
        let text = String::from("abc");
        let value = Value::list([Value::from(&input[..]), Value::from(text.as_str())]);
        let owned: Value<'static> = value.into_owned();
        drop(input);
        drop(text);
        assert_eq!(
            owned,
            Value::List(vec![Value::Bytes(vec![1, 2, 3].into()), Value::String("abc".into())])
        );
    }

    #[test]
    fn test_type_labels() {
        assert_eq!(Value::Null.type_label(), "null");
        assert_eq!(Value::U256(U256::ZERO).type_label(), "u256");
        assert_eq!(
            Value::Struct(StructValue::new("Point")).type_label(),
            "Point"
        );
    }
}
