// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! Typed construction of a deadpool claim spend (spec §4.6 phase 2).

use crate::bigint::BigInt;
use crate::deadpool::tx::OutPoint;
use crate::error::RpcError;
use crate::script::{check_div, claim_hash};
use opcodes::push_opcode;

use crate::script::opcodes;

pub struct ClaimSpend {
    /// Entries being spent, all sharing the same `N` (spec §4.6: "may
    /// batch multiple entries of the *same* N in one transaction").
    pub entries: Vec<OutPoint>,
    pub n: BigInt,
    pub p: BigInt,
    pub destination_script: Vec<u8>,
}

impl ClaimSpend {
    pub fn new(entries: Vec<OutPoint>, n: BigInt, p: BigInt, destination_script: Vec<u8>) -> Self {
        Self { entries, n, p, destination_script }
    }

    /// `n mod p == 0` — the RPC's own pre-check (spec §7: "wrong
    /// `solution` (verified by `n mod p == 0`)") ahead of full
    /// `OP_CHECKDIVVERIFY` script validation.
    pub fn verify_solution(&self) -> Result<(), RpcError> {
        check_div(&self.n, &self.p).map_err(|_| RpcError::WrongSolution)
    }

    pub fn claim_hash(&self) -> [u8; 32] {
        claim_hash(&self.p.to_signed_bytes(), &self.destination_script)
    }

    /// `PUSH(claimHash32) PUSH(p_bytes)` (spec §4.6 claim scriptSig).
    pub fn build_script_sig(&self) -> Vec<u8> {
        let p_bytes = self.p.to_signed_bytes();
        let mut sig = Vec::with_capacity(2 + 32 + p_bytes.len());
        sig.push(32);
        sig.extend_from_slice(&self.claim_hash());
        if let Some(op) = push_opcode(p_bytes.len()) {
            sig.push(op);
        }
        sig.extend_from_slice(&p_bytes);
        sig
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_solution_accepted() {
        let claim =
            ClaimSpend::new(vec![OutPoint::new([1u8; 32], 0)], BigInt::from(143i64), BigInt::from(11i64), vec![9]);
        assert_eq!(claim.verify_solution(), Ok(()));
    }

    #[test]
    fn wrong_solution_rejected() {
        let claim =
            ClaimSpend::new(vec![OutPoint::new([1u8; 32], 0)], BigInt::from(143i64), BigInt::from(10i64), vec![9]);
        assert_eq!(claim.verify_solution(), Err(RpcError::WrongSolution));
    }

    #[test]
    fn script_sig_carries_claim_hash_and_solution() {
        let claim =
            ClaimSpend::new(vec![OutPoint::new([1u8; 32], 0)], BigInt::from(143i64), BigInt::from(11i64), vec![9]);
        let sig = claim.build_script_sig();
        assert_eq!(sig[0], 32);
        assert_eq!(&sig[1..33], &claim.claim_hash());
    }
}
