// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Forward-only read cursor.
//!
//! Byte and string reads return views into the input (`&'a [u8]`,
//! `&'a str`); no decoded payload is copied.

use super::LengthPrefix;
use crate::core::wide::{U256, U512};
use crate::error::{DecodeError, DecodeErrorKind, DecodeResult};

/// Generate fixed-width little-endian readers.
///
/// Each generated method checks the remaining length (returns
/// `DecodeErrorKind::OutOfBounds` on underrun), converts and advances.
macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> DecodeResult<$type> {
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(self.read_bytes($size)?);
            Ok(<$type>::from_le_bytes(bytes))
        }
    };
}

/// Immutable cursor for reading (bounds-checked, zero-copy)
#[derive(Debug, Clone)]
pub struct BufferReader<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> BufferReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }

    impl_read_le!(read_u8, u8, 1);
    impl_read_le!(read_u16, u16, 2);
    impl_read_le!(read_u32, u32, 4);
    impl_read_le!(read_u64, u64, 8);
    impl_read_le!(read_u128, u128, 16);

    pub fn read_u256(&mut self) -> DecodeResult<U256> {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(self.read_bytes(32)?);
        Ok(U256::from_le_bytes(bytes))
    }

    pub fn read_u512(&mut self) -> DecodeResult<U512> {
        let mut bytes = [0u8; 64];
        bytes.copy_from_slice(self.read_bytes(64)?);
        Ok(U512::from_le_bytes(bytes))
    }

    /// Strict boolean: only 0 and 1 are accepted.
    pub fn read_bool(&mut self) -> DecodeResult<bool> {
        let offset = self.offset;
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(DecodeError::new(DecodeErrorKind::InvalidBool { offset, value })),
        }
    }

    pub fn read_f32(&mut self) -> DecodeResult<f32> {
        let offset = self.offset;
        let value = f32::from_bits(self.read_u32()?);
        if value.is_nan() {
            return Err(DecodeError::new(DecodeErrorKind::NotANumber { offset, kind: "f32" }));
        }
        Ok(value)
    }

    pub fn read_f64(&mut self) -> DecodeResult<f64> {
        let offset = self.offset;
        let value = f64::from_bits(self.read_u64()?);
        if value.is_nan() {
            return Err(DecodeError::new(DecodeErrorKind::NotANumber { offset, kind: "f64" }));
        }
        Ok(value)
    }

    /// Exactly `len` bytes, zero-copy.
    pub fn read_bytes(&mut self, len: usize) -> DecodeResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(DecodeError::new(DecodeErrorKind::OutOfBounds {
                offset: self.offset,
                needed: len,
                remaining: self.remaining(),
            }));
        }
        let slice = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    /// Read a length at the prefix width.
    pub fn read_length(&mut self, prefix: LengthPrefix) -> DecodeResult<u64> {
        Ok(match prefix {
            LengthPrefix::U8 => u64::from(self.read_u8()?),
            LengthPrefix::U16 => u64::from(self.read_u16()?),
            LengthPrefix::U32 => u64::from(self.read_u32()?),
        })
    }

    /// Length-prefixed bytes; the announced length must fit the remaining input.
    pub fn read_prefixed_bytes(&mut self, prefix: LengthPrefix) -> DecodeResult<&'a [u8]> {
        let offset = self.offset;
        let length = self.read_length(prefix)?;
        if length > self.remaining() as u64 {
            return Err(DecodeError::new(DecodeErrorKind::InvalidLength {
                offset,
                length,
                remaining: self.remaining(),
            }));
        }
        self.read_bytes(length as usize)
    }

    pub fn read_string(&mut self, prefix: LengthPrefix) -> DecodeResult<&'a str> {
        let offset = self.offset;
        let bytes = self.read_prefixed_bytes(prefix)?;
        std::str::from_utf8(bytes)
            .map_err(|_| DecodeError::new(DecodeErrorKind::InvalidUtf8 { offset }))
    }
}
