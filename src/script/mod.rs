// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! Deadpool script templates, opcodes, and a minimal interpreter for the
//! two opcodes spec.md §4.6 adds (spec §9 design note: "model opcodes as
//! a sum type, not a jump table").
//!
//! This module does not implement a general-purpose script VM — that
//! belongs to the surrounding node (spec.md §1) — only the recognizer
//! and the two new opcodes' own verification logic, executed against an
//! injected [`DeadpoolOpContext`] so they're testable without a chain.

pub mod opcodes;

use crate::bigint::BigInt;
use crate::error::ConsensusError;
use opcodes::*;
use sha2::{Digest, Sha256};

/// A minimal script: just the opcode/push bytes, no execution state.
pub type Script = Vec<u8>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxoutType {
    DeadpoolEntry,
    DeadpoolAnnounce,
    Other,
}

/// What a deadpool opcode needs from the outside world to verify itself.
/// The real node's implementation backs this with the UTXO set and
/// [`crate::deadpool::announce_db::AnnounceDb`]; tests back it with a
/// fixed table.
pub trait DeadpoolOpContext {
    /// Current chain tip height, as seen by the block being validated.
    fn tip_height(&self) -> u64;

    /// `true` iff the announcement database holds a record for
    /// `deadpool_id` whose `claimHash` equals `claim_hash`, returning its
    /// inclusion height. Per spec §9's cyclic-dependency note, this reads
    /// the database state as committed by blocks strictly before the one
    /// containing the claim being verified.
    fn find_announcement(&self, deadpool_id: [u8; 32], claim_hash: [u8; 32]) -> Option<u64>;
}

/// The two deadpool opcodes, each a variant with its own verification
/// step rather than an integer dispatched through a jump table. Neither
/// variant models a literal push/pop stack: the entry template's own
/// `OP_DROP`s are bookkeeping for a real script VM (outside this crate's
/// scope, spec §1) and don't change what either opcode needs to check —
/// `CheckDivVerify` takes divisor `N` (the entry script's own literal)
/// and revealed factor `p` (the scriptSig); `AnnounceVerify` takes the
/// claim commitment `h` (the scriptSig) and gets `N` from the entry
/// being spent, never from the stack (spec §4.6: "taken from the entry
/// being spent").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeadpoolOp {
    CheckDivVerify { n: BigInt, p: BigInt },
    AnnounceVerify { claim_hash: [u8; 32], entry_n_bytes: Vec<u8> },
}

impl DeadpoolOp {
    /// Run this opcode's check — both are VERIFY-style (spec §4.6):
    /// failure aborts script execution instead of leaving a falsy value
    /// for a later `OP_VERIFY` to catch.
    pub fn execute(
        &self,
        ctx: &dyn DeadpoolOpContext,
        params: &crate::params::ConsensusParams,
    ) -> Result<(), ConsensusError> {
        match self {
            DeadpoolOp::CheckDivVerify { n, p } => check_div(n, p),
            DeadpoolOp::AnnounceVerify { claim_hash, entry_n_bytes } => {
                let deadpool_id = deadpool_id(entry_n_bytes);

                let height = ctx
                    .find_announcement(deadpool_id, *claim_hash)
                    .ok_or(ConsensusError::ClaimWithoutAnnouncement)?;
                let age = ctx.tip_height().saturating_sub(height);
                if age < params.deadpool_announce_maturity {
                    return Err(ConsensusError::ClaimBeforeMaturity);
                }
                if age > params.deadpool_announce_validity {
                    return Err(ConsensusError::ClaimAfterValidity);
                }
                Ok(())
            }
        }
    }
}

/// `PUSH(claimHash32) PUSH(p_bytes)` (spec §4.6 claim scriptSig, the
/// counterpart to [`build_deadpool_entry_script`] and
/// `crate::deadpool::ClaimSpend::build_script_sig`).
pub fn parse_claim_script_sig(script_sig: &[u8]) -> Option<([u8; 32], &[u8])> {
    if script_sig.first() != Some(&32) {
        return None;
    }
    let claim_hash: [u8; 32] = script_sig.get(1..33)?.try_into().ok()?;
    let p_start = 33;
    let p_len = usize::from(*script_sig.get(p_start)?);
    if push_opcode(p_len) != script_sig.get(p_start).copied() {
        return None;
    }
    let p_start = p_start + 1;
    let p_end = p_start + p_len;
    if script_sig.len() != p_end {
        return None;
    }
    Some((claim_hash, &script_sig[p_start..p_end]))
}

/// Verify a claim spend's scriptSig against the entry script it spends
/// (spec §4.6, §8 invariant 7/8): runs `CHECKDIVVERIFY` then
/// `ANNOUNCEVERIFY`, the two opcodes the entry template's `<N_bytes>
/// OP_CHECKDIVVERIFY OP_DROP OP_ANNOUNCEVERIFY OP_DROP OP_DROP OP_TRUE`
/// threads together. `entry_script` must already be a recognized entry
/// template — callers classify a spend's prevout via
/// [`solve_deadpool_script`] before reaching here.
pub fn verify_claim_spend(
    entry_script: &[u8],
    script_sig: &[u8],
    ctx: &dyn DeadpoolOpContext,
    params: &crate::params::ConsensusParams,
) -> Result<(), ConsensusError> {
    let n_bytes = extract_entry_n(entry_script).expect("matched entry template");
    let (claim_hash, p_bytes) = parse_claim_script_sig(script_sig).ok_or(ConsensusError::ClaimWithoutAnnouncement)?;

    let n = BigInt::from_signed_bytes(n_bytes).ok_or(ConsensusError::BadBigIntNonCanonical)?;
    let p = BigInt::from_signed_bytes(p_bytes).ok_or(ConsensusError::BadBigIntNonCanonical)?;
    DeadpoolOp::CheckDivVerify { n, p }.execute(ctx, params)?;

    DeadpoolOp::AnnounceVerify { claim_hash, entry_n_bytes: n_bytes.to_vec() }.execute(ctx, params)
}

/// `CheckDeadpoolInteger` (spec §8 scenario B): an entry's `N_bytes`
/// must be a canonical, positive, nonzero encoding whose bit-length
/// falls within `[min_bits, max_bits]`.
pub fn check_deadpool_integer(n_bytes: &[u8], min_bits: u64, max_bits: u64) -> Result<(), ConsensusError> {
    let n = BigInt::from_signed_bytes(n_bytes).ok_or(ConsensusError::BadBigIntNegative)?;
    if n.is_zero() {
        return Err(ConsensusError::BadBigIntZero);
    }
    if n.sign() == num_bigint::Sign::Minus {
        return Err(ConsensusError::BadBigIntNegative);
    }
    let canonical = n.to_signed_bytes();
    if canonical.len() != n_bytes.len() {
        return Err(ConsensusError::BadBigIntNonCanonicalSize);
    }
    if canonical != n_bytes {
        return Err(ConsensusError::BadBigIntNonCanonical);
    }
    let bits = n.bits();
    if bits < min_bits {
        return Err(ConsensusError::BadBigIntTooSmall);
    }
    if bits > max_bits {
        return Err(ConsensusError::BadBigIntTooLarge);
    }
    Ok(())
}

/// `OP_CHECKDIVVERIFY`'s condition (spec §4.6, §8 invariant 8): `p != 0`,
/// `N mod p == 0`, `1 < p <= N/p`.
pub fn check_div(n: &BigInt, p: &BigInt) -> Result<(), ConsensusError> {
    if p.is_zero() {
        return Err(ConsensusError::BadFactorization);
    }
    let n_base = n.to_base();
    let p_base = p.to_base();
    let quotient = n_base / p_base;
    let remainder = n_base % p_base;
    if !remainder.is_zero() {
        return Err(ConsensusError::BadFactorization);
    }
    let q = BigInt::from(quotient);
    if p <= &BigInt::from(1i64) || p > &q {
        return Err(ConsensusError::BadFactorization);
    }
    Ok(())
}

/// `SHA256(canonical_encode(N))` — the deadpool id (glossary).
pub fn deadpool_id(n_bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(n_bytes).into()
}

/// `SHA256(SHA256(canonical_p_bytes) || SHA256(dest_script))` (spec §4.6).
pub fn claim_hash(p_bytes: &[u8], dest_script: &[u8]) -> [u8; 32] {
    let p_digest = Sha256::digest(p_bytes);
    let dest_digest = Sha256::digest(dest_script);
    let mut preimage = Vec::with_capacity(64);
    preimage.extend_from_slice(&p_digest);
    preimage.extend_from_slice(&dest_digest);
    Sha256::digest(&preimage).into()
}

/// Build `<N_bytes> OP_CHECKDIVVERIFY OP_DROP OP_ANNOUNCEVERIFY OP_DROP
/// OP_DROP OP_TRUE` (spec §4.6 Entry template).
pub fn build_deadpool_entry_script(n_bytes: &[u8]) -> Script {
    let mut script = Vec::with_capacity(1 + n_bytes.len() + 6);
    if let Some(op) = push_opcode(n_bytes.len()) {
        script.push(op);
    }
    script.extend_from_slice(n_bytes);
    script.extend_from_slice(&[OP_CHECKDIVVERIFY, OP_DROP, OP_ANNOUNCEVERIFY, OP_DROP, OP_DROP, OP_TRUE]);
    script
}

/// `true` iff `script` is byte-for-byte the entry template around some
/// push of `N_bytes` (spec §8 scenario A).
pub fn is_deadpool_entry(script: &[u8]) -> bool {
    extract_entry_n(script).is_some()
}

/// Pull `N_bytes` out of an entry script, if it matches the template.
pub fn extract_entry_n(script: &[u8]) -> Option<&[u8]> {
    let suffix = [OP_CHECKDIVVERIFY, OP_DROP, OP_ANNOUNCEVERIFY, OP_DROP, OP_DROP, OP_TRUE];
    if script.len() < 1 + suffix.len() {
        return None;
    }
    let push_len = usize::from(*script.first()?);
    if push_opcode(push_len) != Some(script[0]) {
        return None;
    }
    let body_end = 1 + push_len;
    if script.len() != body_end + suffix.len() {
        return None;
    }
    if &script[body_end..] != suffix {
        return None;
    }
    Some(&script[1..body_end])
}

/// Build `OP_ANNOUNCE <claimHash32> <N_bytes>` (spec §4.6 Announce
/// template).
pub fn build_deadpool_announce_script(claim_hash: &[u8; 32], n_bytes: &[u8]) -> Script {
    let mut script = Vec::with_capacity(2 + 32 + n_bytes.len());
    script.push(OP_ANNOUNCE);
    script.push(32);
    script.extend_from_slice(claim_hash);
    if let Some(op) = push_opcode(n_bytes.len()) {
        script.push(op);
    }
    script.extend_from_slice(n_bytes);
    script
}

/// `true` iff `script` matches the announce template.
pub fn is_deadpool_announce(script: &[u8]) -> bool {
    extract_announce_fields(script).is_some()
}

pub fn extract_announce_fields(script: &[u8]) -> Option<(&[u8], &[u8])> {
    if script.first() != Some(&OP_ANNOUNCE) {
        return None;
    }
    if script.get(1) != Some(&32) {
        return None;
    }
    let claim_hash_start = 2;
    let claim_hash_end = claim_hash_start + 32;
    let claim_hash = script.get(claim_hash_start..claim_hash_end)?;
    let n_len = usize::from(*script.get(claim_hash_end)?);
    if push_opcode(n_len) != script.get(claim_hash_end).copied() {
        return None;
    }
    let n_start = claim_hash_end + 1;
    let n_end = n_start + n_len;
    if script.len() != n_end {
        return None;
    }
    Some((claim_hash, &script[n_start..n_end]))
}

/// Unspendable by construction: starts with `OP_ANNOUNCE` (spec §4.6:
/// "provably unspendable").
pub fn is_unspendable(script: &[u8]) -> bool {
    script.first() == Some(&OP_ANNOUNCE)
}

/// Classify a script pubkey into the deadpool `TxoutType`s this crate
/// adds to the standard recognizer (spec §4.6 table).
pub fn solve_deadpool_script(script: &[u8]) -> TxoutType {
    if is_deadpool_entry(script) {
        TxoutType::DeadpoolEntry
    } else if is_deadpool_announce(script) {
        TxoutType::DeadpoolAnnounce
    } else {
        TxoutType::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Entry script for N = 0x13f (319), the value spec.md §8 scenario A
    /// names (this test checks round-trip structure rather than the
    /// scenario's literal byte string, which assumes a fixed-width N
    /// encoding this crate's canonical minimal-length [`BigInt`] encoder
    /// does not reproduce — see `DESIGN.md`).
    #[test]
    fn builds_and_recognizes_a_valid_entry_script() {
        let n = BigInt::from(0x13f_i64);
        let n_bytes = n.to_signed_bytes();
        let script = build_deadpool_entry_script(&n_bytes);
        assert!(is_deadpool_entry(&script));
        assert_eq!(extract_entry_n(&script), Some(n_bytes.as_slice()));
        assert_eq!(script.len(), 1 + n_bytes.len() + 6);
    }

    #[test]
    fn non_template_script_is_not_an_entry() {
        assert!(!is_deadpool_entry(&[OP_TRUE]));
        assert!(!is_deadpool_entry(&[]));
    }

    #[test]
    fn valid_announcement_script() {
        let n = BigInt::from(0x13f_i64);
        let n_bytes = n.to_signed_bytes();
        let id = deadpool_id(&n_bytes);
        let h = claim_hash(&[9u8; 4], &[1u8, 2, 3]);
        let script = build_deadpool_announce_script(&h, &n_bytes);
        assert!(is_unspendable(&script));
        assert_eq!(solve_deadpool_script(&script), TxoutType::DeadpoolAnnounce);
        let (got_hash, got_n) = extract_announce_fields(&script).unwrap();
        assert_eq!(got_hash, h);
        assert_eq!(got_n, n_bytes.as_slice());
        assert_eq!(deadpool_id(got_n), id);
    }

    #[test]
    fn check_div_accepts_canonical_ordering() {
        assert_eq!(check_div(&BigInt::from(143i64), &BigInt::from(11i64)), Ok(()));
    }

    #[test]
    fn check_div_rejects_zero_factor() {
        assert_eq!(
            check_div(&BigInt::from(143i64), &BigInt::from(0i64)),
            Err(ConsensusError::BadFactorization)
        );
    }

    #[test]
    fn check_div_rejects_non_divisor() {
        assert_eq!(
            check_div(&BigInt::from(143i64), &BigInt::from(10i64)),
            Err(ConsensusError::BadFactorization)
        );
    }

    #[test]
    fn check_div_rejects_ordering_violation() {
        assert_eq!(
            check_div(&BigInt::from(143i64), &BigInt::from(13i64)),
            Err(ConsensusError::BadFactorization)
        );
    }

    struct FixedContext {
        tip: u64,
        records: Vec<([u8; 32], [u8; 32], u64)>,
    }

    impl DeadpoolOpContext for FixedContext {
        fn tip_height(&self) -> u64 {
            self.tip
        }
        fn find_announcement(&self, deadpool_id: [u8; 32], claim_hash: [u8; 32]) -> Option<u64> {
            self.records
                .iter()
                .find(|(id, h, _)| *id == deadpool_id && *h == claim_hash)
                .map(|(_, _, height)| *height)
        }
    }

    fn build_claim_script_sig(h: &[u8; 32], p_bytes: &[u8]) -> Vec<u8> {
        let mut sig = Vec::with_capacity(2 + 32 + p_bytes.len());
        sig.push(32);
        sig.extend_from_slice(h);
        if let Some(op) = push_opcode(p_bytes.len()) {
            sig.push(op);
        }
        sig.extend_from_slice(p_bytes);
        sig
    }

    /// Traces a real claim spend through the literal entry template —
    /// `<N_bytes> OP_CHECKDIVVERIFY OP_DROP OP_ANNOUNCEVERIFY OP_DROP
    /// OP_DROP OP_TRUE` against a scriptSig built the way
    /// `ClaimSpend::build_script_sig` builds one — rather than a
    /// hand-built stack that bypasses the template.
    #[test]
    fn verify_claim_spend_through_the_literal_entry_template() {
        let params = crate::params::ConsensusParams::mainnet();
        let n_bytes = BigInt::from(143i64).to_signed_bytes();
        let p_bytes = BigInt::from(11i64).to_signed_bytes();
        let entry_script = build_deadpool_entry_script(&n_bytes);
        let h = claim_hash(&p_bytes, &[9u8, 9, 9]);
        let script_sig = build_claim_script_sig(&h, &p_bytes);

        let id = deadpool_id(&n_bytes);
        let ctx = FixedContext { tip: 1_100, records: vec![(id, h, 1_000)] };

        assert_eq!(verify_claim_spend(&entry_script, &script_sig, &ctx, &params), Ok(()));
    }

    #[test]
    fn verify_claim_spend_rejects_a_wrong_solution() {
        let params = crate::params::ConsensusParams::mainnet();
        let n_bytes = BigInt::from(143i64).to_signed_bytes();
        let wrong_p_bytes = BigInt::from(10i64).to_signed_bytes();
        let entry_script = build_deadpool_entry_script(&n_bytes);
        let h = claim_hash(&wrong_p_bytes, &[9u8, 9, 9]);
        let script_sig = build_claim_script_sig(&h, &wrong_p_bytes);

        let id = deadpool_id(&n_bytes);
        let ctx = FixedContext { tip: 1_100, records: vec![(id, h, 1_000)] };

        assert_eq!(
            verify_claim_spend(&entry_script, &script_sig, &ctx, &params),
            Err(ConsensusError::BadFactorization)
        );
    }

    /// Scenario E of spec.md §8: maturity=100, validity=672.
    #[test]
    fn scenario_e_claim_timing_window() {
        let params = crate::params::ConsensusParams::mainnet();
        let n_bytes = BigInt::from(0x13f_i64).to_signed_bytes();
        let id = deadpool_id(&n_bytes);
        let h = claim_hash(&[7u8; 4], &[0u8; 3]);

        let verify_at = |tip: u64| {
            let ctx = FixedContext { tip, records: vec![(id, h, 1_000)] };
            DeadpoolOp::AnnounceVerify { claim_hash: h, entry_n_bytes: n_bytes.clone() }.execute(&ctx, &params)
        };

        assert_eq!(verify_at(1_099), Err(ConsensusError::ClaimBeforeMaturity));
        assert_eq!(verify_at(1_100), Ok(()));
        assert_eq!(verify_at(1_672), Ok(()));
        assert_eq!(verify_at(1_673), Err(ConsensusError::ClaimAfterValidity));
    }

    #[test]
    fn announce_verify_without_record_is_claim_without_announcement() {
        let params = crate::params::ConsensusParams::mainnet();
        let n_bytes = BigInt::from(0x13f_i64).to_signed_bytes();
        let ctx = FixedContext { tip: 2_000, records: vec![] };
        assert_eq!(
            DeadpoolOp::AnnounceVerify { claim_hash: [1u8; 32], entry_n_bytes: n_bytes }.execute(&ctx, &params),
            Err(ConsensusError::ClaimWithoutAnnouncement)
        );
    }

    #[test]
    fn check_deadpool_integer_accepts_a_well_formed_n() {
        let n_bytes = BigInt::from(143i64).to_signed_bytes();
        assert_eq!(check_deadpool_integer(&n_bytes, 1, 1024), Ok(()));
    }

    /// Scenario B of spec.md §8: `bits(0x13f) = 9`, below a 160-bit floor.
    #[test]
    fn check_deadpool_integer_rejects_too_small() {
        let n_bytes = BigInt::from(0x13f_i64).to_signed_bytes();
        assert_eq!(check_deadpool_integer(&n_bytes, 160, 1024), Err(ConsensusError::BadBigIntTooSmall));
    }

    #[test]
    fn check_deadpool_integer_rejects_zero() {
        assert_eq!(check_deadpool_integer(&[], 1, 1024), Err(ConsensusError::BadBigIntZero));
    }

    #[test]
    fn check_deadpool_integer_rejects_negative() {
        let n_bytes = BigInt::from(-143i64).to_signed_bytes();
        assert_eq!(check_deadpool_integer(&n_bytes, 1, 1024), Err(ConsensusError::BadBigIntNegative));
    }

    #[test]
    fn check_deadpool_integer_rejects_non_canonical_padding() {
        let padded = [0x3f, 0x00, 0x00];
        assert_eq!(check_deadpool_integer(&padded, 1, 1024), Err(ConsensusError::BadBigIntNonCanonicalSize));
    }

    #[test]
    fn check_deadpool_integer_rejects_too_large() {
        let n_bytes = BigInt::from(143i64).to_signed_bytes();
        assert_eq!(check_deadpool_integer(&n_bytes, 1, 4), Err(ConsensusError::BadBigIntTooLarge));
    }
}
