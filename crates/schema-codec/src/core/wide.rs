// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed-width 256-bit and 512-bit unsigned integers.
//!
//! Only what the codec needs: little-endian byte conversion, ordering,
//! significant-bit counting, decimal formatting/parsing and lossless
//! conversions to and from the native integer types. No arithmetic API.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Conversion between integer widths would lose bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WideIntError {
    /// Significant bits of the source value.
    pub bits: u32,
    /// Name of the requested target type.
    pub target: &'static str,
}

impl fmt::Display for WideIntError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "value needs {} bits and does not fit losslessly into {}",
            self.bits, self.target
        )
    }
}

impl std::error::Error for WideIntError {}

/// Decimal string could not be parsed into a wide integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWideIntError(String);

impl fmt::Display for ParseWideIntError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid wide integer literal: {}", self.0)
    }
}

impl std::error::Error for ParseWideIntError {}

const TEN_POW_19: u64 = 10_000_000_000_000_000_000;

/// Generate a wide unsigned integer backed by little-endian `u64` limbs.
macro_rules! wide_uint {
    ($name:ident, $limbs:expr, $bytes:expr, $label:expr) => {
        #[doc = concat!("Unsigned ", $label, " integer stored as little-endian 64-bit limbs.")]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name([u64; $limbs]);

        impl $name {
            /// Encoded width in bytes.
            pub const BYTES: usize = $bytes;
            pub const ZERO: Self = Self([0; $limbs]);
            pub const MAX: Self = Self([u64::MAX; $limbs]);

            /// Build from limbs, least significant first.
            pub const fn from_limbs(limbs: [u64; $limbs]) -> Self {
                Self(limbs)
            }

            pub const fn limbs(&self) -> &[u64; $limbs] {
                &self.0
            }

            pub fn from_le_bytes(bytes: [u8; $bytes]) -> Self {
                let mut limbs = [0u64; $limbs];
                for (limb, chunk) in limbs.iter_mut().zip(bytes.chunks_exact(8)) {
                    let mut word = [0u8; 8];
                    word.copy_from_slice(chunk);
                    *limb = u64::from_le_bytes(word);
                }
                Self(limbs)
            }

            pub fn to_le_bytes(&self) -> [u8; $bytes] {
                let mut bytes = [0u8; $bytes];
                for (chunk, limb) in bytes.chunks_exact_mut(8).zip(self.0.iter()) {
                    chunk.copy_from_slice(&limb.to_le_bytes());
                }
                bytes
            }

            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|limb| *limb == 0)
            }

            /// Number of significant bits (0 for zero).
            pub fn bits(&self) -> u32 {
                for (i, limb) in self.0.iter().enumerate().rev() {
                    if *limb != 0 {
                        return (i as u32) * 64 + (64 - limb.leading_zeros());
                    }
                }
                0
            }

            fn div_rem_small(&self, divisor: u64) -> (Self, u64) {
                let mut quotient = [0u64; $limbs];
                let mut rem: u128 = 0;
                for i in (0..$limbs).rev() {
                    let cur = (rem << 64) | u128::from(self.0[i]);
                    quotient[i] = (cur / u128::from(divisor)) as u64;
                    rem = cur % u128::from(divisor);
                }
                (Self(quotient), rem as u64)
            }

            /// `self * mul + add`, `None` on overflow.
            fn checked_mul_add_small(&self, mul: u64, add: u64) -> Option<Self> {
                let mut out = [0u64; $limbs];
                let mut carry = u128::from(add);
                for i in 0..$limbs {
                    let cur = u128::from(self.0[i]) * u128::from(mul) + carry;
                    out[i] = cur as u64;
                    carry = cur >> 64;
                }
                if carry != 0 {
                    return None;
                }
                Some(Self(out))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.iter().rev().cmp(other.0.iter().rev())
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl From<u128> for $name {
            fn from(value: u128) -> Self {
                let mut limbs = [0u64; $limbs];
                limbs[0] = value as u64;
                limbs[1] = (value >> 64) as u64;
                Self(limbs)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self::from(u128::from(value))
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self::from(u128::from(value))
            }
        }

        impl TryFrom<$name> for u128 {
            type Error = WideIntError;

            fn try_from(value: $name) -> Result<Self, Self::Error> {
                if value.bits() > 128 {
                    return Err(WideIntError {
                        bits: value.bits(),
                        target: "u128",
                    });
                }
                Ok(u128::from(value.0[0]) | (u128::from(value.0[1]) << 64))
            }
        }

        impl TryFrom<$name> for u64 {
            type Error = WideIntError;

            fn try_from(value: $name) -> Result<Self, Self::Error> {
                if value.bits() > 64 {
                    return Err(WideIntError {
                        bits: value.bits(),
                        target: "u64",
                    });
                }
                Ok(value.0[0])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_zero() {
                    return f.pad_integral(true, "", "0");
                }
                let mut chunks = Vec::new();
                let mut rest = *self;
                while !rest.is_zero() {
                    let (q, r) = rest.div_rem_small(TEN_POW_19);
                    chunks.push(r);
                    rest = q;
                }
                let mut digits = String::with_capacity(chunks.len() * 19);
                if let Some((head, tail)) = chunks.split_last() {
                    digits.push_str(&head.to_string());
                    for chunk in tail.iter().rev() {
                        digits.push_str(&format!("{:019}", chunk));
                    }
                }
                f.pad_integral(true, "", &digits)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = ParseWideIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.is_empty() {
                    return Err(ParseWideIntError(s.to_string()));
                }
                let mut acc = Self::ZERO;
                for c in s.chars() {
                    let digit = c
                        .to_digit(10)
                        .ok_or_else(|| ParseWideIntError(s.to_string()))?;
                    acc = acc
                        .checked_mul_add_small(10, u64::from(digit))
                        .ok_or_else(|| ParseWideIntError(s.to_string()))?;
                }
                Ok(acc)
            }
        }
    };
}

wide_uint!(U256, 4, 32, "256-bit");
wide_uint!(U512, 8, 64, "512-bit");

impl From<U256> for U512 {
    fn from(value: U256) -> Self {
        let mut limbs = [0u64; 8];
        limbs[..4].copy_from_slice(value.limbs());
        U512::from_limbs(limbs)
    }
}

impl TryFrom<U512> for U256 {
    type Error = WideIntError;

    fn try_from(value: U512) -> Result<Self, Self::Error> {
        if value.bits() > 256 {
            return Err(WideIntError {
                bits: value.bits(),
                target: "u256",
            });
        }
        let mut limbs = [0u64; 4];
        limbs.copy_from_slice(&value.limbs()[..4]);
        Ok(U256::from_limbs(limbs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_le_bytes_layout() {
        let value = U256::from(0x0102_0304u64);
        let bytes = value.to_le_bytes();
        assert_eq!(&bytes[..4], &[4, 3, 2, 1]);
        assert!(bytes[4..].iter().all(|b| *b == 0));
        assert_eq!(U256::from_le_bytes(bytes), value);
    }

    #[test]
    fn test_bits_and_ordering() {
        assert_eq!(U512::ZERO.bits(), 0);
        assert_eq!(U512::from(1u64).bits(), 1);
        assert_eq!(U256::MAX.bits(), 256);
        assert_eq!(U512::from(u128::MAX).bits(), 128);
        assert!(U256::from(u128::MAX) < U256::MAX);
        assert!(U512::from(U256::MAX) > U512::from(u128::MAX));
    }

    #[test]
    fn test_lossless_conversions() {
        let small = U256::from(42u64);
        assert_eq!(u64::try_from(small), Ok(42));
        assert_eq!(u128::try_from(U256::from(u128::MAX)), Ok(u128::MAX));

        let err = u64::try_from(U256::from(u128::from(u64::MAX) + 1)).unwrap_err();
        assert_eq!(err.bits, 65);
        assert_eq!(err.target, "u64");

        assert!(U256::try_from(U512::MAX).is_err());
        assert_eq!(U256::try_from(U512::from(U256::MAX)), Ok(U256::MAX));
    }

    #[test]
    fn test_decimal_display_and_parse() {
        assert_eq!(U256::ZERO.to_string(), "0");
        assert_eq!(U256::from(u128::MAX).to_string(), u128::MAX.to_string());
        assert_eq!(
            U256::MAX.to_string(),
            "115792089237316195423570985008687907853269984665640564039457584007913129639935"
        );
        let parsed: U256 = U256::MAX.to_string().parse().expect("max should parse");
        assert_eq!(parsed, U256::MAX);

        let too_big = format!("{}0", U256::MAX);
        assert!(too_big.parse::<U256>().is_err());
        assert!("12a".parse::<U512>().is_err());
        assert!("".parse::<U512>().is_err());
    }
}
