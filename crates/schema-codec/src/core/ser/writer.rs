// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Two-phase buffer builder.
//!
//! Every `write_*` call only records a [`PendingWrite`] (absolute offset plus
//! payload) and bumps the running length. Checks run at this point, so a
//! failing value aborts before any output exists. [`BufferWriter::finalize`]
//! allocates the output once, sized to the final length, and replays the
//! records into it.
//!
//! Byte and string payloads are borrowed from the value being encoded for
//! the writer's lifetime `'v`; nothing is copied until `finalize`.

use super::{out_of_range, LengthPrefix};
use crate::core::wide::{U256, U512};
use crate::error::{EncodeError, EncodeErrorKind, EncodeResult};
use std::sync::Arc;

const INLINE_CAPACITY: usize = 16;

#[derive(Debug)]
enum Payload<'v> {
    Inline { bytes: [u8; INLINE_CAPACITY], len: u8 },
    Borrowed(&'v [u8]),
    Owned(Vec<u8>),
    Shared(Arc<[u8]>),
}

impl Payload<'_> {
    fn as_slice(&self) -> &[u8] {
        match self {
            Self::Inline { bytes, len } => &bytes[..*len as usize],
            Self::Borrowed(data) => data,
            Self::Owned(data) => data,
            Self::Shared(data) => data,
        }
    }
}

/// Deferred write: payload destined for `offset` in the final buffer.
#[derive(Debug)]
struct PendingWrite<'v> {
    offset: usize,
    payload: Payload<'v>,
}

/// Generate fixed-width integer writers (infallible, the type bounds the value).
macro_rules! impl_write_le {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self, value: $type) {
            self.push_inline(&value.to_le_bytes());
        }
    };
}

/// Append-only writer collecting deferred writes.
#[derive(Debug, Default)]
pub struct BufferWriter<'v> {
    ops: Vec<PendingWrite<'v>>,
    total: usize,
}

impl<'v> BufferWriter<'v> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes declared so far, i.e. the offset of the next write.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    fn push(&mut self, payload: Payload<'v>) {
        let len = payload.as_slice().len();
        if len == 0 {
            return;
        }
        self.ops.push(PendingWrite {
            offset: self.total,
            payload,
        });
        self.total += len;
    }

    fn push_inline(&mut self, data: &[u8]) {
        debug_assert!(data.len() <= INLINE_CAPACITY);
        let mut bytes = [0u8; INLINE_CAPACITY];
        bytes[..data.len()].copy_from_slice(data);
        self.push(Payload::Inline {
            bytes,
            len: data.len() as u8,
        });
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    impl_write_le!(write_u8, u8);
    impl_write_le!(write_u16, u16);
    impl_write_le!(write_u32, u32);
    impl_write_le!(write_u64, u64);
    impl_write_le!(write_u128, u128);

    pub fn write_u256(&mut self, value: &U256) {
        self.push(Payload::Owned(value.to_le_bytes().to_vec()));
    }

    pub fn write_u512(&mut self, value: &U512) {
        self.push(Payload::Owned(value.to_le_bytes().to_vec()));
    }

    /// Write the low `width` bytes of `value`, rejecting values that need more.
    pub fn write_uint(&mut self, width: usize, value: &U512) -> EncodeResult<()> {
        if value.bits() as usize > width * 8 {
            return Err(out_of_range(width, value).into());
        }
        let bytes = value.to_le_bytes();
        if width <= INLINE_CAPACITY {
            self.push_inline(&bytes[..width]);
        } else {
            self.push(Payload::Owned(bytes[..width].to_vec()));
        }
        Ok(())
    }

    pub fn write_f32(&mut self, value: f32) -> EncodeResult<()> {
        if value.is_nan() {
            return Err(EncodeError::new(EncodeErrorKind::NotANumber { kind: "f32" }));
        }
        self.push_inline(&value.to_le_bytes());
        Ok(())
    }

    pub fn write_f64(&mut self, value: f64) -> EncodeResult<()> {
        if value.is_nan() {
            return Err(EncodeError::new(EncodeErrorKind::NotANumber { kind: "f64" }));
        }
        self.push_inline(&value.to_le_bytes());
        Ok(())
    }

    /// Write a length at the prefix width.
    pub fn write_length(&mut self, prefix: LengthPrefix, len: usize) -> EncodeResult<()> {
        if len as u64 > prefix.max_len() {
            return Err(out_of_range(prefix.width(), len).into());
        }
        match prefix {
            LengthPrefix::U8 => self.write_u8(len as u8),
            LengthPrefix::U16 => self.write_u16(len as u16),
            LengthPrefix::U32 => self.write_u32(len as u32),
        }
        Ok(())
    }

    /// Length-prefixed UTF-8; the prefix counts bytes, not characters.
    pub fn write_string(&mut self, value: &'v str, prefix: LengthPrefix) -> EncodeResult<()> {
        self.write_bytes(value.as_bytes(), prefix)
    }

    /// Length-prefixed raw bytes.
    pub fn write_bytes(&mut self, data: &'v [u8], prefix: LengthPrefix) -> EncodeResult<()> {
        self.write_length(prefix, data.len())?;
        self.write_raw(data);
        Ok(())
    }

    /// Unprefixed bytes borrowed from the encoded value.
    pub fn write_raw(&mut self, data: &'v [u8]) {
        self.push(Payload::Borrowed(data));
    }

    /// Unprefixed bytes produced during encoding.
    pub fn write_owned(&mut self, data: Vec<u8>) {
        self.push(Payload::Owned(data));
    }

    /// Unprefixed bytes shared with a cache.
    pub fn write_shared(&mut self, data: Arc<[u8]>) {
        self.push(Payload::Shared(data));
    }

    /// Allocate the output once and replay every pending write.
    pub fn finalize(self) -> Vec<u8> {
        let mut buf = vec![0u8; self.total];
        for op in &self.ops {
            let data = op.payload.as_slice();
            buf[op.offset..op.offset + data.len()].copy_from_slice(data);
        }
        buf
    }
}
