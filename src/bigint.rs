// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! Signed arbitrary-precision integers with the canonical little-endian
//! encoding consensus relies on (spec §3, §4.1).
//!
//! Canonical form: little-endian magnitude bytes, sign bit in the top bit
//! of the last byte. A byte-aligned magnitude (whose most significant
//! magnitude byte already has its top bit set) needs one extra zero byte
//! appended to host the sign bit without corrupting the magnitude. Zero is
//! the empty byte string.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Deref, DerefMut};

pub use num_bigint::BigInt as BaseBigInt;
use num_bigint::Sign;
use num_integer::Integer;
use num_traits::{Signed, Zero};

/// Thin newtype over [`num_bigint::BigInt`], following the same pattern as
/// `forest_bigint::BigInt`: a `Deref`-transparent wrapper that adds the
/// consensus-specific canonical encoding this crate needs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BigInt {
    num: BaseBigInt,
}

impl BigInt {
    pub fn zero() -> Self {
        Self { num: BaseBigInt::zero() }
    }

    pub fn from_decimal_str(s: &str) -> Option<Self> {
        s.parse::<BaseBigInt>().ok().map(Self::from)
    }

    /// Decode a canonical or non-canonical sign-magnitude encoding.
    ///
    /// Returns `None` only for a negative zero (sign bit set, magnitude all
    /// zero) — the one encoding the spec calls out as invalid regardless of
    /// canonical-size rules. Callers that must enforce full canonical-ness
    /// (the deadpool entry script, the PoW header fields) additionally call
    /// [`BigInt::is_canonical_encoding`].
    pub fn from_signed_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() {
            return Some(Self::zero());
        }
        let mut magnitude = bytes.to_vec();
        let last = magnitude.len() - 1;
        let negative = magnitude[last] & 0x80 != 0;
        magnitude[last] &= 0x7f;
        let is_zero_magnitude = magnitude.iter().all(|&b| b == 0);
        if negative && is_zero_magnitude {
            return None;
        }
        let sign = if is_zero_magnitude {
            Sign::NoSign
        } else if negative {
            Sign::Minus
        } else {
            Sign::Plus
        };
        Some(Self::from(BaseBigInt::from_bytes_le(sign, &magnitude)))
    }

    /// Encode in canonical form: minimal little-endian magnitude, sign bit
    /// packed into the top bit of the last byte, with an extra zero byte
    /// inserted only when the magnitude's own top bit is already occupied.
    pub fn to_signed_bytes(&self) -> Vec<u8> {
        if self.num.is_zero() {
            return Vec::new();
        }
        let negative = self.num.is_negative();
        let mut bytes = self.num.magnitude().to_bytes_le();
        if bytes.last().map_or(true, |b| b & 0x80 != 0) {
            bytes.push(0);
        }
        if negative {
            if let Some(top) = bytes.last_mut() {
                *top |= 0x80;
            }
        }
        bytes
    }

    /// `true` iff `bytes` is exactly what [`to_signed_bytes`] would produce
    /// for `from_signed_bytes(bytes)` — i.e. `bytes` carries no redundant
    /// padding and isn't a negative zero.
    pub fn is_canonical_encoding(bytes: &[u8]) -> bool {
        match Self::from_signed_bytes(bytes) {
            Some(n) => n.to_signed_bytes() == bytes,
            None => false,
        }
    }

    /// Number of bits in the magnitude (`0` for zero, matching GMP's
    /// `mpz_sizeinbase(n, 2)` convention used by the reference chain).
    pub fn bits(&self) -> u64 {
        self.num.magnitude().bits()
    }

    pub fn sign(&self) -> Sign {
        self.num.sign()
    }

    pub fn is_zero(&self) -> bool {
        self.num.is_zero()
    }

    /// Non-negative modulus for a positive divisor, matching GMP's
    /// `mpz_mod` convention (spec §4.1).
    pub fn mod_euclid(&self, modulus: &BigInt) -> BigInt {
        debug_assert!(modulus.num.is_positive(), "mod_euclid requires a positive modulus");
        BigInt::from(self.num.mod_floor(&modulus.num))
    }

    pub fn to_base(&self) -> &BaseBigInt {
        &self.num
    }
}

impl From<i64> for BigInt {
    fn from(n: i64) -> Self {
        Self { num: BaseBigInt::from(n) }
    }
}

impl From<u64> for BigInt {
    fn from(n: u64) -> Self {
        Self { num: BaseBigInt::from(n) }
    }
}

impl From<BaseBigInt> for BigInt {
    fn from(num: BaseBigInt) -> Self {
        Self { num }
    }
}

impl Deref for BigInt {
    type Target = BaseBigInt;
    fn deref(&self) -> &Self::Target {
        &self.num
    }
}

impl DerefMut for BigInt {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.num
    }
}

impl fmt::Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.num.fmt(f)
    }
}

impl fmt::LowerHex for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.num.fmt(f)
    }
}

impl PartialOrd for BigInt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BigInt {
    fn cmp(&self, other: &Self) -> Ordering {
        // Delegate to num_bigint, which already orders by sign first and
        // magnitude second — spelled out here only because it's a
        // consensus-relevant property (spec §4.1: "comparisons treat sign
        // correctly").
        self.num.cmp(&other.num)
    }
}

pub mod serde_sign_prefixed {
    //! `serde` (de)serialization mirroring `forest_bigint::bigint_ser`: a
    //! leading sign byte (`0` = positive/zero, `1` = negative) followed by
    //! big-endian magnitude bytes. Used only at RPC/JSON boundaries — the
    //! canonical little-endian encoding in [`super::BigInt`] is the
    //! consensus wire format.
    use super::BigInt;
    use num_bigint::Sign;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(int: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        let (sign, mut bz) = int.to_base().to_bytes_be();
        match sign {
            Sign::Minus => bz.insert(0, 1),
            Sign::Plus => bz.insert(0, 0),
            Sign::NoSign => bz = Vec::new(),
        }
        serde_bytes::Bytes::new(&bz).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        let mut bz: Vec<u8> = serde_bytes::ByteBuf::deserialize(deserializer)?.into_vec();
        if bz.is_empty() {
            return Ok(BigInt::zero());
        }
        let sign_byte = bz.remove(0);
        let sign = match sign_byte {
            0 => Sign::Plus,
            1 => Sign::Minus,
            _ => return Err(serde::de::Error::custom("first byte must be a valid sign (0, 1)")),
        };
        Ok(BigInt::from(num_bigint::BigInt::from_bytes_be(sign, &bz)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_empty() {
        assert_eq!(BigInt::zero().to_signed_bytes(), Vec::<u8>::new());
        assert_eq!(BigInt::from_signed_bytes(&[]).unwrap(), BigInt::zero());
    }

    #[test]
    fn negative_zero_is_rejected() {
        assert!(BigInt::from_signed_bytes(&[0x80]).is_none());
        assert!(BigInt::from_signed_bytes(&[0x00, 0x80]).is_none());
    }

    #[test]
    fn extra_byte_inserted_when_top_bit_occupied() {
        // 0xff alone would collide with the sign bit; canonical encoding
        // inserts a zero byte to host it.
        let n = BigInt::from(0xffi64);
        let bytes = n.to_signed_bytes();
        assert_eq!(bytes, vec![0xff, 0x00]);
        assert_eq!(BigInt::from_signed_bytes(&bytes).unwrap(), n);
    }

    #[test]
    fn sign_bit_reused_when_free() {
        let n = BigInt::from(0x3fi64);
        assert_eq!(n.to_signed_bytes(), vec![0x3f]);
        let neg = BigInt::from(-0x3fi64);
        assert_eq!(neg.to_signed_bytes(), vec![0xbf]);
    }

    #[test]
    fn roundtrip_decode_encode() {
        for n in [0i64, 1, -1, 127, 128, -128, 255, 256, 1 << 40, -(1 << 40)] {
            let b = BigInt::from(n);
            let enc = b.to_signed_bytes();
            assert_eq!(BigInt::from_signed_bytes(&enc).unwrap(), b);
            assert!(BigInt::is_canonical_encoding(&enc));
        }
    }

    #[test]
    fn non_canonical_padding_detected() {
        // 0x3f01 (LE) decodes as the same magnitude 0x013f but with a
        // redundant zero pushed past where the sign bit already fit —
        // not what the canonical encoder would emit.
        let padded = [0x3f, 0x00, 0x00];
        assert!(!BigInt::is_canonical_encoding(&padded));
    }

    #[test]
    fn mod_euclid_is_non_negative() {
        let a = BigInt::from(-7i64);
        let m = BigInt::from(5i64);
        assert_eq!(a.mod_euclid(&m), BigInt::from(3i64));
    }

    #[test]
    fn ordering_is_sign_aware() {
        assert!(BigInt::from(-1i64) < BigInt::from(1i64));
        assert!(BigInt::from(-100i64) < BigInt::from(-1i64));
    }
}
