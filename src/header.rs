// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! Block header (spec §3, wire layout spec §6).
//!
//! Follows forest's `BlockHeader` pattern (`blockchain/blocks/src/header.rs`):
//! a `derive_builder::Builder`-generated constructor with per-field doc
//! comments of uneven density, plus a hand-rolled codec rather than a
//! serde derive, because the byte layout — nVersion, hashPrevBlock,
//! hashMerkleRoot, nTime, nBits, nNonce, wOffset, nP1, in that exact order
//! — is consensus-critical and must not drift with serde's defaults.

use derive_builder::Builder;

/// Width, in bytes, of the `nP1` field: 1024 bits, little-endian.
pub const NP1_BYTES: usize = 128;

#[derive(Clone, Debug, PartialEq, Eq, Builder)]
#[builder(name = "BlockHeaderBuilder")]
pub struct BlockHeader {
    pub version: i32,

    /// Hash of the previous block in the chain.
    pub prev_hash: [u8; 32],

    /// Merkle root of the block's transactions.
    pub merkle_root: [u8; 32],

    /// Seconds since the Unix epoch.
    pub time: u32,

    /// Declared bit-length of the semiprime `N` — not a compact difficulty
    /// target (spec §3).
    pub bits: u16,

    pub nonce: u64,

    /// Signed displacement of `N` from the `gHash`-derived seed `W`.
    pub w_offset: i64,

    /// One of the two prime factors of `N`, little-endian, zero-padded to
    /// [`NP1_BYTES`].
    #[builder(default = "[0u8; NP1_BYTES]")]
    pub np1: [u8; NP1_BYTES],
}

impl BlockHeader {
    pub fn builder() -> BlockHeaderBuilder {
        BlockHeaderBuilder::default()
    }

    /// `nP1` as a canonical signed-magnitude [`crate::bigint::BigInt`].
    /// `nP1` is always non-negative by construction (a prime factor), so
    /// decoding never hits the negative-zero rejection path.
    pub fn np1_bigint(&self) -> crate::bigint::BigInt {
        crate::bigint::BigInt::from_signed_bytes(&self.np1)
            .expect("nP1 magnitude field is never a negative-zero encoding")
    }

    /// Consensus-encoded bytes, in the exact field order spec §6 specifies.
    pub fn consensus_encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + 32 + 32 + 4 + 2 + 8 + 8 + NP1_BYTES);
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.prev_hash);
        out.extend_from_slice(&self.merkle_root);
        out.extend_from_slice(&self.time.to_le_bytes());
        out.extend_from_slice(&self.bits.to_le_bytes());
        out.extend_from_slice(&self.nonce.to_le_bytes());
        out.extend_from_slice(&self.w_offset.to_le_bytes());
        out.extend_from_slice(&self.np1);
        out
    }

    pub fn consensus_decode(bytes: &[u8]) -> Option<Self> {
        const FIXED_LEN: usize = 4 + 32 + 32 + 4 + 2 + 8 + 8 + NP1_BYTES;
        if bytes.len() != FIXED_LEN {
            return None;
        }
        let mut cursor = 0usize;
        macro_rules! take {
            ($n:expr) => {{
                let slice = &bytes[cursor..cursor + $n];
                cursor += $n;
                slice
            }};
        }
        let version = i32::from_le_bytes(take!(4).try_into().ok()?);
        let prev_hash: [u8; 32] = take!(32).try_into().ok()?;
        let merkle_root: [u8; 32] = take!(32).try_into().ok()?;
        let time = u32::from_le_bytes(take!(4).try_into().ok()?);
        let bits = u16::from_le_bytes(take!(2).try_into().ok()?);
        let nonce = u64::from_le_bytes(take!(8).try_into().ok()?);
        let w_offset = i64::from_le_bytes(take!(8).try_into().ok()?);
        let np1: [u8; NP1_BYTES] = take!(NP1_BYTES).try_into().ok()?;
        Some(Self { version, prev_hash, merkle_root, time, bits, nonce, w_offset, np1 })
    }
}
