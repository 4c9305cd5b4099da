// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! `CheckProofOfWork` (spec §4.3): the eight-step rejection ladder that
//! turns a header's claimed semiprime into an accept/reject verdict.

use crate::bigint::BigInt;
use crate::error::ConsensusError;
use crate::header::BlockHeader;
use crate::params::ConsensusParams;
use crate::pow::ghash::ghash;
use crate::primality::is_probable_prime;
use num_bigint::BigUint;

/// Verify `header`'s proof of work against `params`. Pure and stateless:
/// no I/O, no suspension points, bounded allocation per call (spec §5).
pub fn check_proof_of_work(header: &BlockHeader, params: &ConsensusParams) -> Result<(), ConsensusError> {
    if header.bits < params.pow_limit || header.bits >= params.pow_max_bits {
        return Err(ConsensusError::BadBits);
    }

    let max_offset = 16i64.saturating_mul(i64::from(header.bits));
    if header.w_offset.unsigned_abs() as i64 > max_offset {
        return Err(ConsensusError::BadOffset);
    }

    let n = derive_n(header, params);
    let np1 = header.np1_bigint();
    verify_semiprime(&n, &np1, header.bits, params.miller_rabin_rounds)
}

/// `N = W + wOffset` — the sign lives in `wOffset` itself (spec §4.3 step
/// 3), exposed separately because the deadpool RPC surface (e.g.
/// `getdeadpoolid`) and miner code both need to recompute `N` without
/// re-running the full verification ladder.
pub fn derive_n(header: &BlockHeader, params: &ConsensusParams) -> BigInt {
    let w = ghash(header, params);
    let w_int = BigUint::from_bytes_le(&w);
    BigInt::from(num_bigint::BigInt::from(w_int) + num_bigint::BigInt::from(header.w_offset))
}

/// Steps 4–8 of spec §4.3, factored out as a pure function over `N` and
/// the claimed factor `nP1` so it can be exercised without mining a real
/// `gHash` seed: bit-length match, exact division, factor-size and
/// ordering checks, and the Miller–Rabin primality tests on both factors.
pub fn verify_semiprime(n: &BigInt, np1: &BigInt, bits: u16, rounds: u32) -> Result<(), ConsensusError> {
    if n.bits() != u64::from(bits) {
        return Err(ConsensusError::BadOffset);
    }
    if np1.is_zero() {
        return Err(ConsensusError::BadFactorization);
    }

    let n_base = n.to_base();
    let np1_base = np1.to_base();
    let np2_base = n_base / np1_base;
    let remainder = n_base % np1_base;
    if !remainder.is_zero() {
        return Err(ConsensusError::BadFactorization);
    }
    let np2 = BigInt::from(np2_base);

    let expected_np1_bits = (u64::from(bits) + 1) / 2;
    if np1.bits() != expected_np1_bits {
        return Err(ConsensusError::MisSizedFactor);
    }
    if np1 > &np2 {
        return Err(ConsensusError::BadFactorization);
    }

    let np1_unsigned = np1.to_base().magnitude().clone();
    let np2_unsigned = np2.to_base().magnitude().clone();
    if !is_probable_prime(&np1_unsigned, rounds) || !is_probable_prime(&np2_unsigned, rounds) {
        return Err(ConsensusError::NonPrimeFactor);
    }

    Ok(())
}
