// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! Typed construction of a deadpool announcement output (spec §4.6
//! phase 1 of the claim protocol).

use crate::bigint::BigInt;
use crate::deadpool::tx::{Amount, TxOut};
use crate::script::{build_deadpool_announce_script, claim_hash, deadpool_id};

pub struct DeadpoolAnnounce {
    pub n: BigInt,
    pub p: BigInt,
    pub destination_script: Vec<u8>,
    pub burn: Amount,
}

impl DeadpoolAnnounce {
    pub fn new(n: BigInt, p: BigInt, destination_script: Vec<u8>, burn: Amount) -> Self {
        Self { n, p, destination_script, burn }
    }

    pub fn deadpool_id(&self) -> [u8; 32] {
        deadpool_id(&self.n.to_signed_bytes())
    }

    pub fn claim_hash(&self) -> [u8; 32] {
        claim_hash(&self.p.to_signed_bytes(), &self.destination_script)
    }

    /// Fails the caller's burn amount check before even building the
    /// template, mirroring the RPC's `insufficient-burn` user error
    /// (spec §7) rather than letting a too-small burn reach the chain.
    pub fn to_txout(&self, min_burn: Amount) -> Result<TxOut, crate::error::RpcError> {
        if self.burn < min_burn {
            return Err(crate::error::RpcError::InsufficientBurn { got: self.burn, min: min_burn });
        }
        let script = build_deadpool_announce_script(&self.claim_hash(), &self.n.to_signed_bytes());
        Ok(TxOut { value: self.burn, script_pubkey: script })
    }
}
