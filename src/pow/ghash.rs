// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! `gHash`: the memory-hard, deterministic seed-point derivation of spec
//! §4.2. Scratch state lives in [`GhashScratch`] so a miner hammering this
//! in a loop reuses one 256-byte buffer per worker thread instead of
//! allocating on every call (spec §9's "stack-or-arena-allocated and
//! reused within a call" guidance, made concrete).
//!
//! The 128-byte-half / 64-byte-digest interaction below is the literal,
//! unfixed reproduction of the ambiguity flagged in spec §9: each half is
//! *nominally* replaced by a "BLAKE2b-1024" or "SHA3-512" digest, but both
//! primitives in fact only produce 64 bytes, so only the first half of
//! each 128-byte slice is overwritten and the trailing 64 bytes carry
//! over untouched. Do not "fix" this — it is consensus-critical as-is.

use crate::header::BlockHeader;
use crate::params::ConsensusParams;
use crate::primality::next_prime;
use digest::Digest;
use num_bigint::{BigInt, BigUint};
use num_integer::Roots;
use num_traits::{One, Zero};
use scrypt::Params as ScryptParams;
use sha3::Sha3_512;
use whirlpool::Whirlpool;

/// Width of `W`, in bytes: 2048 bits.
pub const W_BYTES: usize = 256;

/// Reusable scratch state for repeated `gHash` calls from one thread.
/// Never shared across threads — each caller owns its own instance, which
/// is what makes concurrent `gHash` calls (spec §5) safe without locking.
pub struct GhashScratch {
    buffer: [u8; W_BYTES],
}

impl Default for GhashScratch {
    fn default() -> Self {
        Self { buffer: [0u8; W_BYTES] }
    }
}

/// Derive the 2048-bit seed `W`, truncated to exactly `header.bits` bits
/// with the top bit forced to 1.
pub fn ghash(header: &BlockHeader, params: &ConsensusParams) -> [u8; W_BYTES] {
    let mut scratch = GhashScratch::default();
    ghash_with_scratch(header, params, &mut scratch)
}

pub fn ghash_with_scratch(
    header: &BlockHeader,
    params: &ConsensusParams,
    scratch: &mut GhashScratch,
) -> [u8; W_BYTES] {
    let mut password = Vec::with_capacity(72);
    password.extend_from_slice(&header.prev_hash);
    password.extend_from_slice(&header.merkle_root);
    password.extend_from_slice(&header.nonce.to_le_bytes());

    let mut salt = Vec::with_capacity(10);
    salt.extend_from_slice(&header.version.to_le_bytes());
    salt.extend_from_slice(&header.bits.to_le_bytes());
    salt.extend_from_slice(&header.time.to_le_bytes());

    // N=2^12, r=2, p=1: ~1 MiB working set, the memory-hard part.
    let scrypt_params = ScryptParams::new(12, 2, 1, W_BYTES).expect("static scrypt params are valid");
    scrypt::scrypt(&password, &salt, &scrypt_params, &mut scratch.buffer)
        .expect("output length matches the fixed buffer");

    for _ in 0..params.hash_rounds.max(1) {
        let current = scratch.buffer;
        scrypt::scrypt(&current, &salt, &scrypt_params, &mut scratch.buffer)
            .expect("output length matches the fixed buffer");

        let (lo, hi) = scratch.buffer.split_at_mut(W_BYTES / 2);
        update_half(lo);
        update_half(hi);

        let m = BigUint::from_bytes_le(&scratch.buffer);
        let a = m.sqrt();
        let p = next_prime(&a.sqrt());
        let mut a_inv = mod_inverse(&a, &p).unwrap_or_else(BigUint::one);
        xor_into(&mut scratch.buffer, &a_inv.to_bytes_le());

        let i = (popcount_bytes(&a_inv.to_bytes_le()) & 0x7f).max(1);
        for _ in 0..i {
            a_inv = a_inv.modpow(&BigUint::from(i), &p);
            xor_into(&mut scratch.buffer, &a_inv.to_bytes_le());
            let selector = popcount_bytes(&scratch.buffer) % 3;
            apply_selector_update(&mut scratch.buffer, selector);
        }
    }

    truncate_to_bits(&mut scratch.buffer, header.bits);
    scratch.buffer
}

fn update_half(half: &mut [u8]) {
    debug_assert_eq!(half.len(), W_BYTES / 4);
    let set_bits = popcount_bytes(half);
    let digest: [u8; 64] = if set_bits % 2 == 0 {
        let hash = blake2b_simd::blake2b(half);
        hash.as_bytes().try_into().expect("blake2b default output is 64 bytes")
    } else {
        Sha3_512::digest(&half[..]).into()
    };
    half[..64].copy_from_slice(&digest);
    // half[64..] (the trailing 64 bytes) intentionally carries over.
}

/// Selector-driven update of a 128- or 256-byte slice with one of the
/// three remaining primitives. The exact offsets are this crate's
/// deterministic resolution of the "offsets per the table" reference in
/// spec §4.2 — the source table itself did not survive distillation; see
/// `DESIGN.md`.
fn apply_selector_update(buffer: &mut [u8; W_BYTES], selector: u32) {
    match selector {
        0 => {
            let digest = Sha3_512::digest(&buffer[0..128]);
            buffer[0..64].copy_from_slice(&digest);
        }
        1 => {
            let hash = blake2b_simd::blake2b(&buffer[..]);
            buffer[0..64].copy_from_slice(hash.as_bytes());
        }
        _ => {
            let digest = Whirlpool::digest(&buffer[128..256]);
            buffer[128..192].copy_from_slice(&digest);
        }
    }
}

fn xor_into(buffer: &mut [u8; W_BYTES], bytes: &[u8]) {
    for (i, b) in bytes.iter().take(W_BYTES).enumerate() {
        buffer[i] ^= b;
    }
}

fn popcount_bytes(bytes: &[u8]) -> u32 {
    bytes.iter().map(|b| b.count_ones()).sum()
}

fn mod_inverse(a: &BigUint, modulus: &BigUint) -> Option<BigUint> {
    if modulus <= &BigUint::one() {
        return None;
    }
    let a = BigInt::from(a.clone());
    let m = BigInt::from(modulus.clone());
    let (g, x, _) = extended_gcd(a.clone().rem_euclid(&m), m.clone());
    if g != BigInt::one() {
        return None;
    }
    let inv = ((x % &m) + &m) % &m;
    inv.to_biguint()
}

fn extended_gcd(a: BigInt, b: BigInt) -> (BigInt, BigInt, BigInt) {
    if b.is_zero() {
        return (a, BigInt::one(), BigInt::zero());
    }
    let q = &a / &b;
    let r = &a - &q * &b;
    let (g, x1, y1) = extended_gcd(b, r);
    (g, y1.clone(), x1 - q * y1)
}

trait RemEuclidBigInt {
    fn rem_euclid(self, m: &BigInt) -> BigInt;
}

impl RemEuclidBigInt for BigInt {
    fn rem_euclid(self, m: &BigInt) -> BigInt {
        let r = &self % m;
        if r.sign() == num_bigint::Sign::Minus {
            r + m
        } else {
            r
        }
    }
}

fn truncate_to_bits(buffer: &mut [u8; W_BYTES], bits: u16) {
    let bits = bits as usize;
    let full_bytes = bits / 8;
    let rem_bits = bits % 8;
    let top_byte_index = if rem_bits == 0 { full_bytes - 1 } else { full_bytes };

    for b in buffer.iter_mut().skip(top_byte_index + 1) {
        *b = 0;
    }
    if rem_bits != 0 {
        let mask: u8 = (1u16 << rem_bits) as u8 - 1;
        buffer[top_byte_index] &= mask;
    }

    let msb_byte = (bits - 1) / 8;
    let msb_bit = (bits - 1) % 8;
    buffer[msb_byte] |= 1 << msb_bit;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::NP1_BYTES;

    fn header(bits: u16) -> BlockHeader {
        BlockHeader::builder()
            .version(1)
            .prev_hash([7u8; 32])
            .merkle_root([9u8; 32])
            .time(1_735_689_600)
            .bits(bits)
            .nonce(123456)
            .w_offset(0)
            .np1([0u8; NP1_BYTES])
            .build()
            .unwrap()
    }

    #[test]
    fn is_deterministic_in_header_bytes() {
        let params = ConsensusParams::mainnet();
        let h = header(230);
        assert_eq!(ghash(&h, &params), ghash(&h, &params));
    }

    #[test]
    fn bitlength_matches_requested_bits() {
        let params = ConsensusParams::mainnet();
        for bits in [210u16, 230, 256, 511, 512] {
            let h = header(bits);
            let w = ghash(&h, &params);
            let n = BigUint::from_bytes_le(&w);
            assert_eq!(n.bits(), bits as u64, "bits={bits}");
        }
    }

    #[test]
    fn different_nonce_changes_output() {
        let params = ConsensusParams::mainnet();
        let mut h1 = header(230);
        let mut h2 = h1.clone();
        h1.nonce = 1;
        h2.nonce = 2;
        assert_ne!(ghash(&h1, &params), ghash(&h2, &params));
    }

    #[test]
    fn truncate_sets_top_bit_only_in_range() {
        let mut buf = [0xffu8; W_BYTES];
        truncate_to_bits(&mut buf, 9);
        let n = BigUint::from_bytes_le(&buf);
        assert_eq!(n.bits(), 9);
    }
}
