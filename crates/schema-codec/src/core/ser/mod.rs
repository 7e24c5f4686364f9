// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Primitive wire codec.
//!
//! Little-endian, no padding, no alignment. Integers are unsigned and
//! range-checked against their width before anything is written; floats
//! refuse NaN in both directions; strings and byte sequences carry a length
//! prefix whose width is chosen per field ([`LengthPrefix`]).

pub mod cursor;
pub mod writer;

pub use cursor::BufferReader;
pub use writer::BufferWriter;

use crate::error::EncodeErrorKind;
use std::fmt;

/// Scalar wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
    U512,
    F32,
    F64,
    /// UTF-8 string with a 4-byte length prefix.
    String,
}

impl PrimitiveKind {
    /// Encoded width in bytes, `None` for strings.
    pub const fn width(self) -> Option<usize> {
        match self {
            Self::Bool | Self::U8 => Some(1),
            Self::U16 => Some(2),
            Self::U32 | Self::F32 => Some(4),
            Self::U64 | Self::F64 => Some(8),
            Self::U128 => Some(16),
            Self::U256 => Some(32),
            Self::U512 => Some(64),
            Self::String => None,
        }
    }

    pub const fn is_unsigned(self) -> bool {
        matches!(
            self,
            Self::U8 | Self::U16 | Self::U32 | Self::U64 | Self::U128 | Self::U256 | Self::U512
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::U128 => "u128",
            Self::U256 => "u256",
            Self::U512 => "u512",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::String => "string",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Width of the length prefix in front of strings, byte sequences and lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LengthPrefix {
    U8,
    U16,
    #[default]
    U32,
}

impl LengthPrefix {
    pub const fn width(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }

    /// Largest length the prefix can carry.
    pub const fn max_len(self) -> u64 {
        match self {
            Self::U8 => u8::MAX as u64,
            Self::U16 => u16::MAX as u64,
            Self::U32 => u32::MAX as u64,
        }
    }

    pub const fn kind(self) -> PrimitiveKind {
        match self {
            Self::U8 => PrimitiveKind::U8,
            Self::U16 => PrimitiveKind::U16,
            Self::U32 => PrimitiveKind::U32,
        }
    }
}

/// Build the range error for an unsigned integer of `width` bytes.
///
/// Narrow widths print the exact maximum, wide ones the power of two bound.
pub(crate) fn out_of_range(width: usize, value: impl fmt::Display) -> EncodeErrorKind {
    let range = if width <= 3 {
        let max = (1u64 << (width * 8)) - 1;
        format!(">= 0 and <= {}", max)
    } else {
        format!(">= 0 and < 2 ** {}", width * 8)
    };
    EncodeErrorKind::OutOfRange {
        range,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widths() {
        assert_eq!(PrimitiveKind::Bool.width(), Some(1));
        assert_eq!(PrimitiveKind::U256.width(), Some(32));
        assert_eq!(PrimitiveKind::U512.width(), Some(64));
        assert_eq!(PrimitiveKind::F32.width(), Some(4));
        assert_eq!(PrimitiveKind::String.width(), None);
        assert!(PrimitiveKind::U128.is_unsigned());
        assert!(!PrimitiveKind::F64.is_unsigned());
    }

    #[test]
    fn test_length_prefix_bounds() {
        assert_eq!(LengthPrefix::default(), LengthPrefix::U32);
        assert_eq!(LengthPrefix::U8.max_len(), 255);
        assert_eq!(LengthPrefix::U16.width(), 2);
        assert_eq!(LengthPrefix::U32.kind(), PrimitiveKind::U32);
    }

    #[test]
    fn test_range_message() {
        let narrow = out_of_range(1, 256);
        assert_eq!(
            narrow,
            EncodeErrorKind::OutOfRange {
                range: ">= 0 and <= 255".into(),
                value: "256".into()
            }
        );
        let wide = out_of_range(8, "18446744073709551616");
        assert_eq!(
            wide.to_string(),
            "Out of range value: >= 0 and < 2 ** 64, 18446744073709551616"
        );
    }
}
