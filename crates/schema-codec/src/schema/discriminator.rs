// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Variant discriminators.
//!
//! Wire forms:
//!
//! | Kind    | Bytes                                   |
//! |---------|-----------------------------------------|
//! | `Byte`  | one byte                                |
//! | `Bytes` | the sequence, no length prefix          |
//! | `Str`   | u32 length prefix + UTF-8               |

use crate::core::ser::{BufferReader, LengthPrefix};
use crate::error::DecodeResult;
use std::fmt;

/// Value written in front of a level's fields to select it among siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Discriminator {
    Byte(u8),
    Bytes(Vec<u8>),
    Str(String),
}

/// Shape shared by all siblings under one ancestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscriminatorKind {
    Byte,
    /// Fixed sequence of the given length.
    Bytes(usize),
    Str,
}

impl fmt::Display for DiscriminatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Byte => write!(f, "number"),
            Self::Bytes(len) => write!(f, "number[{}]", len),
            Self::Str => write!(f, "string"),
        }
    }
}

impl Discriminator {
    pub fn kind(&self) -> DiscriminatorKind {
        match self {
            Self::Byte(_) => DiscriminatorKind::Byte,
            Self::Bytes(seq) => DiscriminatorKind::Bytes(seq.len()),
            Self::Str(_) => DiscriminatorKind::Str,
        }
    }

    /// Wire bytes of this discriminator.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Byte(b) => vec![*b],
            Self::Bytes(seq) => seq.clone(),
            Self::Str(s) => {
                let mut out = Vec::with_capacity(4 + s.len());
                out.extend_from_slice(&(s.len() as u32).to_le_bytes());
                out.extend_from_slice(s.as_bytes());
                out
            }
        }
    }

    /// Read one discriminator of `kind` from the cursor.
    pub(crate) fn read(
        kind: DiscriminatorKind,
        reader: &mut BufferReader<'_>,
    ) -> DecodeResult<Self> {
        Ok(match kind {
            DiscriminatorKind::Byte => Self::Byte(reader.read_u8()?),
            DiscriminatorKind::Bytes(len) => Self::Bytes(reader.read_bytes(len)?.to_vec()),
            DiscriminatorKind::Str => Self::Str(reader.read_string(LengthPrefix::U32)?.to_string()),
        })
    }
}

impl fmt::Display for Discriminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Byte(b) => write!(f, "{}", b),
            Self::Bytes(seq) => write!(f, "{:?}", seq),
            Self::Str(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<u8> for Discriminator {
    fn from(b: u8) -> Self {
        Self::Byte(b)
    }
}

impl<const N: usize> From<[u8; N]> for Discriminator {
    fn from(seq: [u8; N]) -> Self {
        Self::Bytes(seq.to_vec())
    }
}

impl From<Vec<u8>> for Discriminator {
    fn from(seq: Vec<u8>) -> Self {
        Self::Bytes(seq)
    }
}

impl From<&str> for Discriminator {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Discriminator {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_forms() {
        assert_eq!(Discriminator::from(5u8).to_bytes(), vec![5]);
        assert_eq!(Discriminator::from([3u8, 4]).to_bytes(), vec![3, 4]);
        assert_eq!(
            Discriminator::from("abc").to_bytes(),
            vec![3, 0, 0, 0, 97, 98, 99]
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Discriminator::from(1u8).kind(), DiscriminatorKind::Byte);
        assert_eq!(
            Discriminator::from(vec![1u8, 2, 3]).kind(),
            DiscriminatorKind::Bytes(3)
        );
        assert_ne!(
            Discriminator::from([1u8]).kind(),
            Discriminator::from([1u8, 2]).kind()
        );
        assert_eq!(DiscriminatorKind::Str.to_string(), "string");
    }

    #[test]
    fn test_read_each_kind() {
        let bytes = [7u8, 1, 2, 1, 0, 0, 0, b'z'];
        let mut reader = BufferReader::new(&bytes);
        assert_eq!(
            Discriminator::read(DiscriminatorKind::Byte, &mut reader).expect("byte"),
            Discriminator::Byte(7)
        );
        assert_eq!(
            Discriminator::read(DiscriminatorKind::Bytes(2), &mut reader).expect("seq"),
            Discriminator::Bytes(vec![1, 2])
        );
        assert_eq!(
            Discriminator::read(DiscriminatorKind::Str, &mut reader).expect("str"),
            Discriminator::Str("z".into())
        );
        assert!(reader.is_eof());
    }
}
